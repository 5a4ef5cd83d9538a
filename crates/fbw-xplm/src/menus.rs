//! Menus in the simulator's menu bar.
//!
//! The host addresses items by index, which shifts when items are removed. Each item is
//! therefore identified by a [`MenuItem`] key that doubles as its native refcon, and the menu
//! keeps the keys in host order to translate between the two. Host menus are shared with other
//! plugins, so their items occupy placeholder slots and every wrapper of the same host menu
//! sees one item list.

use crate::api::{xplm, Refcon};
use crate::callback::{guard, CallbackArena, CallbackId};
use crate::command::Command;
use crate::error::{XplmError, XplmResult};
use crate::handle::MenuId;
use crate::strings::to_cstring;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::c_int;
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum MenuCheck {
    NoCheck = 0,
    Unchecked = 1,
    Checked = 2,
}

impl MenuCheck {
    #[inline]
    fn from_raw(raw: c_int) -> Self {
        match raw {
            1 => Self::Unchecked,
            2 => Self::Checked,
            _ => Self::NoCheck,
        }
    }
}

/// Stable identity of an item appended to a [`Menu`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MenuItem(usize);

impl MenuItem {
    #[inline]
    fn to_refcon(self) -> Refcon {
        self.0 as Refcon
    }
}

type MenuHandler = Box<dyn FnMut(MenuItem)>;

/// One host slot. Position in [`MenuCore::items`] is the host index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    /// Added by another plugin, or not known to this one.
    Foreign,
    Separator,
    Item(MenuItem),
}

struct MenuCore {
    items: RefCell<Vec<Slot>>,
    handler: Option<RefCell<MenuHandler>>,
}

impl MenuCore {
    fn new(handler: Option<MenuHandler>) -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            handler: handler.map(RefCell::new),
        }
    }

    fn index_of(&self, item: MenuItem) -> Option<c_int> {
        self.items
            .borrow()
            .iter()
            .position(|slot| *slot == Slot::Item(item))
            .map(|i| i as c_int)
    }

    /// Places `slot` at host `index`, padding any gap with foreign slots.
    fn record(&self, index: usize, slot: Slot) {
        let mut items = self.items.borrow_mut();
        if index < items.len() {
            items.insert(index, slot);
        } else {
            items.resize(index, Slot::Foreign);
            items.push(slot);
        }
    }
}

thread_local! {
    static MENUS: CallbackArena<MenuCore> = CallbackArena::new();
    static HOST_MENUS: RefCell<HashMap<MenuId, Weak<MenuCore>>> = RefCell::new(HashMap::new());
    static NEXT_KEY: Cell<usize> = const { Cell::new(1) };
}

/// The core shared by every live wrapper of host menu `id`.
fn host_core(id: MenuId) -> Rc<MenuCore> {
    HOST_MENUS.with(|menus| {
        let mut menus = menus.borrow_mut();
        if let Some(core) = menus.get(&id).and_then(Weak::upgrade) {
            return core;
        }
        menus.retain(|_, core| core.strong_count() > 0);
        let core = Rc::new(MenuCore::new(None));
        menus.insert(id, Rc::downgrade(&core));
        core
    })
}

pub(crate) fn live_callbacks() -> usize {
    MENUS.with(|a| a.len())
}

fn next_key() -> MenuItem {
    NEXT_KEY.with(|k| {
        let key = k.get();
        k.set(key + 1);
        MenuItem(key)
    })
}

unsafe extern "C" fn menu_trampoline(menu_ref: Refcon, item_ref: Refcon) {
    guard("menu handler", (), || {
        let Some(core) = MENUS.with(|a| a.resolve(menu_ref)) else {
            return;
        };
        let item = MenuItem(item_ref as usize);
        if core.index_of(item).is_none() {
            return;
        }
        let Some(handler) = core.handler.as_ref() else {
            return;
        };
        if let Ok(mut handler) = handler.try_borrow_mut() {
            handler(item);
        };
    })
}

pub struct Menu {
    id: MenuId,
    core: Rc<MenuCore>,
    /// Arena slot of a plugin-created menu; host menus have none and are never destroyed.
    slot: Option<CallbackId>,
    released: bool,
}

impl Menu {
    fn host_menu(raw: crate::api::Handle) -> Option<Self> {
        let id = MenuId::from_raw(raw)?;
        Some(Self {
            id,
            core: host_core(id),
            slot: None,
            released: false,
        })
    }

    /// The "Plugins" menu, shared by all plugins.
    pub fn plugins_menu() -> Option<Self> {
        Self::host_menu(unsafe { (xplm().find_plugins_menu)() })
    }

    /// The menu of the user's aircraft, only available to aircraft plugins.
    pub fn aircraft_menu() -> Option<Self> {
        Self::host_menu(unsafe { (xplm().find_aircraft_menu)() })
    }

    /// Creates a menu, attached as a submenu of `parent`'s item if given.
    pub fn new(
        name: &str,
        parent: Option<(&Menu, MenuItem)>,
        handler: Option<Box<dyn FnMut(MenuItem)>>,
    ) -> XplmResult<Self> {
        let name = to_cstring(name)?;
        let (parent_id, parent_index) = match parent {
            Some((menu, item)) => (
                menu.id.as_raw(),
                menu.core.index_of(item).ok_or_else(|| XplmError::create_failed("menu"))?,
            ),
            None => (std::ptr::null_mut(), 0),
        };

        // The core is in the arena before the host can call back with its refcon.
        let core = Rc::new(MenuCore::new(handler));
        let callback = core.handler.is_some().then_some(menu_trampoline as unsafe extern "C" fn(Refcon, Refcon));
        let slot = MENUS.with(|a| a.insert(core.clone()));
        let raw = unsafe { (xplm().create_menu)(name.as_ptr(), parent_id, parent_index, callback, slot.to_refcon()) };
        let Some(id) = MenuId::from_raw(raw) else {
            MENUS.with(|a| a.remove(slot));
            return Err(XplmError::create_failed("menu"));
        };
        Ok(Self {
            id,
            core,
            slot: Some(slot),
            released: false,
        })
    }

    #[inline]
    pub fn id(&self) -> MenuId {
        self.id
    }

    fn record(&self, index: c_int, slot: Slot) -> XplmResult<()> {
        let Ok(index) = usize::try_from(index) else {
            return Err(XplmError::create_failed("menu item"));
        };
        self.core.record(index, slot);
        Ok(())
    }

    pub fn append_item(&self, name: &str) -> XplmResult<MenuItem> {
        let name = to_cstring(name)?;
        let key = next_key();
        let index = unsafe { (xplm().append_menu_item)(self.id.as_raw(), name.as_ptr(), key.to_refcon(), 0) };
        self.record(index, Slot::Item(key))?;
        Ok(key)
    }

    /// Appends an item that runs `command` when picked instead of calling the menu handler.
    pub fn append_command_item(&self, name: &str, command: &Command) -> XplmResult<MenuItem> {
        let name = to_cstring(name)?;
        let key = next_key();
        let index = unsafe {
            (xplm().append_menu_item_with_command)(self.id.as_raw(), name.as_ptr(), command.id().as_raw())
        };
        self.record(index, Slot::Item(key))?;
        Ok(key)
    }

    pub fn append_separator(&self) -> XplmResult<()> {
        let index = unsafe { (xplm().append_menu_separator)(self.id.as_raw()) };
        self.record(index, Slot::Separator)
    }

    /// Returns `false` if `item` is not on this menu.
    pub fn remove_item(&self, item: MenuItem) -> bool {
        let Some(index) = self.core.index_of(item) else {
            return false;
        };
        unsafe { (xplm().remove_menu_item)(self.id.as_raw(), index) };
        self.core.items.borrow_mut().remove(index as usize);
        true
    }

    pub fn set_item_name(&self, item: MenuItem, name: &str) -> XplmResult<()> {
        let name = to_cstring(name)?;
        if let Some(index) = self.core.index_of(item) {
            unsafe { (xplm().set_menu_item_name)(self.id.as_raw(), index, name.as_ptr(), 0) };
        }
        Ok(())
    }

    pub fn check_item(&self, item: MenuItem, check: MenuCheck) {
        if let Some(index) = self.core.index_of(item) {
            unsafe { (xplm().check_menu_item)(self.id.as_raw(), index, check as c_int) };
        }
    }

    pub fn item_check(&self, item: MenuItem) -> Option<MenuCheck> {
        let index = self.core.index_of(item)?;
        let mut check = 0;
        unsafe { (xplm().check_menu_item_state)(self.id.as_raw(), index, &mut check) };
        Some(MenuCheck::from_raw(check))
    }

    pub fn enable_item(&self, item: MenuItem, enabled: bool) {
        if let Some(index) = self.core.index_of(item) {
            unsafe { (xplm().enable_menu_item)(self.id.as_raw(), index, enabled as c_int) };
        }
    }

    /// Removes every item including the ones other plugins added to a shared menu.
    pub fn clear_items(&self) {
        unsafe { (xplm().clear_all_menu_items)(self.id.as_raw()) };
        self.core.items.borrow_mut().clear();
    }

    #[inline]
    pub fn items(&self) -> Vec<MenuItem> {
        self.core
            .items
            .borrow()
            .iter()
            .filter_map(|slot| match slot {
                Slot::Item(item) => Some(*item),
                _ => None,
            })
            .collect()
    }

    #[inline]
    pub fn destroy(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let Some(slot) = self.slot.take() else {
            return;
        };
        unsafe { (xplm().destroy_menu)(self.id.as_raw()) };
        MENUS.with(|a| a.remove(slot));
    }
}

impl Drop for Menu {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;

    fn recording_menu(name: &str, parent: Option<(&Menu, MenuItem)>) -> (Menu, Rc<RefCell<Vec<MenuItem>>>) {
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = clicks.clone();
        let menu = Menu::new(name, parent, Some(Box::new(move |item| sink.borrow_mut().push(item)))).unwrap();
        (menu, clicks)
    }

    #[test]
    fn submenu_under_plugins_menu() {
        let host = TestHost::new();
        let plugins = Menu::plugins_menu().unwrap();
        let entry = plugins.append_item("FlyByWireless").unwrap();
        let (menu, clicks) = recording_menu("FlyByWireless", Some((&plugins, entry)));
        assert_eq!(host.menu_parent(menu.id()), Some((plugins.id(), 0)));

        let a = menu.append_item("Toggle TCAS").unwrap();
        menu.append_separator().unwrap();
        let b = menu.append_item("About").unwrap();
        host.click_menu_item(menu.id(), 2);
        host.click_menu_item(menu.id(), 0);
        assert_eq!(*clicks.borrow(), vec![b, a]);

        drop(plugins);
        assert_eq!(host.calls("XPLMDestroyMenu"), 0);
        menu.destroy();
        assert_eq!(host.calls("XPLMDestroyMenu"), 1);
    }

    #[test]
    fn shared_plugins_menu_keeps_host_indices() {
        let host = TestHost::new();
        let first = Menu::plugins_menu().unwrap();
        host.add_foreign_menu_item(first.id(), "Other plugin");
        let ours = first.append_item("Ours").unwrap();

        let second = Menu::plugins_menu().unwrap();
        host.add_foreign_menu_item(second.id(), "Late plugin");
        let mine = second.append_item("Mine").unwrap();
        assert_eq!(first.items(), vec![ours, mine]);

        let (sub, _) = recording_menu("Mine", Some((&second, mine)));
        assert_eq!(host.menu_parent(sub.id()), Some((second.id(), 3)));

        second.check_item(mine, MenuCheck::Checked);
        first.enable_item(ours, false);
        first.set_item_name(ours, "Ours (off)").unwrap();
        let states: Vec<_> = (0..4)
            .map(|i| host.menu_item(second.id(), i).map(|it| (it.name, it.check, it.enabled)).unwrap())
            .collect();
        assert_eq!(
            states,
            vec![
                ("Other plugin".to_owned(), 0, true),
                ("Ours (off)".to_owned(), 0, false),
                ("Late plugin".to_owned(), 0, true),
                ("Mine".to_owned(), 2, true),
            ]
        );
        assert_eq!(first.item_check(mine), Some(MenuCheck::Checked));

        assert!(first.remove_item(ours));
        assert_eq!(host.menu_item(second.id(), 0).map(|it| it.name), Some("Other plugin".to_owned()));
        assert_eq!(host.menu_item(second.id(), 1).map(|it| it.name), Some("Late plugin".to_owned()));
        assert!(second.remove_item(mine));
        assert_eq!(host.menu_item(second.id(), 1).map(|it| it.name), Some("Late plugin".to_owned()));
        assert!(host.menu_item(second.id(), 2).is_none());
    }

    #[test]
    fn indices_follow_removals() {
        let host = TestHost::new();
        let (menu, clicks) = recording_menu("Lights", None);
        let beacon = menu.append_item("Beacon").unwrap();
        let strobe = menu.append_item("Strobe").unwrap();
        let landing = menu.append_item("Landing").unwrap();

        assert!(menu.remove_item(strobe));
        assert!(!menu.remove_item(strobe));
        menu.check_item(landing, MenuCheck::Checked);
        assert_eq!(host.menu_item(menu.id(), 1).map(|i| (i.name, i.check)), Some(("Landing".to_owned(), 2)));
        assert_eq!(menu.item_check(landing), Some(MenuCheck::Checked));
        assert_eq!(menu.item_check(beacon), Some(MenuCheck::NoCheck));
        assert_eq!(menu.item_check(strobe), None);

        menu.set_item_name(beacon, "Beacon (red)").unwrap();
        menu.enable_item(beacon, false);
        let item = host.menu_item(menu.id(), 0).unwrap();
        assert_eq!((item.name.as_str(), item.enabled), ("Beacon (red)", false));

        host.click_menu_item(menu.id(), 1);
        assert_eq!(*clicks.borrow(), vec![landing]);
        assert_eq!(menu.items(), vec![beacon, landing]);

        menu.clear_items();
        assert!(menu.items().is_empty());
        assert!(host.menu_item(menu.id(), 0).is_none());
    }

    #[test]
    fn command_items_and_unknown_clicks() {
        let host = TestHost::new();
        host.define_command("sim/lights/beacon_lights_toggle");
        let cmd = Command::find("sim/lights/beacon_lights_toggle").unwrap();
        let (menu, clicks) = recording_menu("Cmds", None);
        menu.append_command_item("Beacon", &cmd).unwrap();
        host.click_menu_item(menu.id(), 0);
        assert_eq!(host.command_executions("sim/lights/beacon_lights_toggle"), 1);
        assert!(clicks.borrow().is_empty());

        host.click_menu_item_with_ref(menu.id(), 0xdead_beef);
        assert!(clicks.borrow().is_empty());
    }

    #[test]
    fn arena_slots_are_freed() {
        let host = TestHost::new();
        let before = live_callbacks();
        let menu = Menu::new("Temp", None, None).unwrap();
        assert_eq!(live_callbacks(), before + 1);
        drop(menu);
        assert_eq!(live_callbacks(), before);

        host.refuse_creation(true);
        assert!(Menu::new("Nope", None, None).is_err());
        assert_eq!(live_callbacks(), before);
    }
}
