//! Demo traffic: one aircraft orbiting the user's position.

use fbw_xplm::data_access::DataRef;
use fbw_xpmp2::{InfoTexts, LegacyAircraft, LightStatus, Orientation, TransponderMode};

const FT_PER_M: f64 = 3.280_84;

/// Circular track around a moving center, clockwise seen from above.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orbit {
    pub radius_nm: f64,
    pub speed_kt: f64,
    /// True bearing from the center to the aircraft.
    pub bearing_deg: f64,
}

impl Orbit {
    pub fn advance(&mut self, dt_s: f64) {
        let circumference_nm = std::f64::consts::TAU * self.radius_nm;
        if circumference_nm <= 0.0 {
            return;
        }
        let travelled_nm = self.speed_kt * dt_s / 3600.0;
        self.bearing_deg = (self.bearing_deg + travelled_nm / circumference_nm * 360.0).rem_euclid(360.0);
    }

    /// `(lat, lon)` on the orbit, flat-earth approximation.
    pub fn position(&self, center_lat: f64, center_lon: f64) -> (f64, f64) {
        let b = self.bearing_deg.to_radians();
        let dlat = self.radius_nm / 60.0 * b.cos();
        let dlon = self.radius_nm / 60.0 * b.sin() / center_lat.to_radians().cos().max(1e-6);
        (center_lat + dlat, center_lon + dlon)
    }

    /// Clockwise tangent.
    #[inline]
    pub fn heading(&self) -> f32 {
        ((self.bearing_deg + 90.0).rem_euclid(360.0)) as f32
    }
}

/// The user's aircraft position, read from the simulator.
pub struct UserPosition {
    lat: DataRef,
    lon: DataRef,
    elevation_m: DataRef,
}

impl UserPosition {
    pub fn find() -> Option<Self> {
        Some(Self {
            lat: DataRef::find("sim/flightmodel/position/latitude")?,
            lon: DataRef::find("sim/flightmodel/position/longitude")?,
            elevation_m: DataRef::find("sim/flightmodel/position/elevation")?,
        })
    }

    /// `(lat, lon, alt_ft)`
    pub fn read(&self) -> (f64, f64, f64) {
        (self.lat.get_double(), self.lon.get_double(), self.elevation_m.get_double() * FT_PER_M)
    }
}

pub struct Traffic {
    aircraft: LegacyAircraft,
    orbit: Orbit,
    /// Feet above the user.
    altitude_offset_ft: f64,
    user: Option<UserPosition>,
}

impl Traffic {
    pub fn new(aircraft: LegacyAircraft, orbit: Orbit, altitude_offset_ft: f64) -> Self {
        aircraft.set_lights(LightStatus::NAV | LightStatus::BEACON | LightStatus::STROBE);
        aircraft.set_radar(4321, TransponderMode::ModeC);
        aircraft.set_info_texts(&InfoTexts {
            tail_number: "D-AIPX".into(),
            icao_type: "A320".into(),
            icao_airline: "DLH".into(),
            flight_number: "DLH4TC".into(),
            ..Default::default()
        });
        aircraft.set_label("DLH4TC");
        Self {
            aircraft,
            orbit,
            altitude_offset_ft,
            user: UserPosition::find(),
        }
    }

    #[inline]
    pub fn aircraft(&self) -> &LegacyAircraft {
        &self.aircraft
    }

    /// Moves the aircraft along the orbit. Without the user's position it stays put.
    pub fn update(&mut self, dt_s: f32) {
        let Some(user) = &self.user else {
            return;
        };
        self.orbit.advance(f64::from(dt_s));
        let (lat, lon, alt_ft) = user.read();
        let (lat, lon) = self.orbit.position(lat, lon);
        self.aircraft.set_location(lat, lon, alt_ft + self.altitude_offset_ft);
        self.aircraft.set_orientation(Orientation {
            pitch: 0.0,
            heading: self.orbit.heading(),
            roll: 25.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orbit() -> Orbit {
        Orbit {
            radius_nm: 2.0,
            speed_kt: 240.0,
            bearing_deg: 0.0,
        }
    }

    #[test]
    fn north_of_center_heads_east() {
        let o = orbit();
        let (lat, lon) = o.position(47.0, 11.0);
        assert!((lat - (47.0 + 2.0 / 60.0)).abs() < 1e-9);
        assert!((lon - 11.0).abs() < 1e-9);
        assert_eq!(o.heading(), 90.0);
    }

    #[test]
    fn full_circle_takes_circumference_over_speed() {
        let mut o = orbit();
        // 2 * pi * 2 nm at 240 kt is about 188.5 s.
        let period = std::f64::consts::TAU * 2.0 / 240.0 * 3600.0;
        o.advance(period / 4.0);
        assert!((o.bearing_deg - 90.0).abs() < 1e-6);
        o.advance(period * 3.0 / 4.0);
        assert!(o.bearing_deg < 1e-6 || (360.0 - o.bearing_deg) < 1e-6);
    }

    #[test]
    fn zero_radius_does_not_move() {
        let mut o = Orbit {
            radius_nm: 0.0,
            ..orbit()
        };
        o.advance(10.0);
        assert_eq!(o.bearing_deg, 0.0);
    }
}
