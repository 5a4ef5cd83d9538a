//! Host commands and their before/after handlers.

use crate::api::{xplm, Handle, Refcon};
use crate::callback::{guard, CallbackArena, CallbackId};
use crate::error::{XplmError, XplmResult};
use crate::handle::CommandId;
use crate::strings::to_cstring;
use std::cell::{Cell, RefCell};
use std::ffi::c_int;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum CommandPhase {
    Begin = 0,
    Continue = 1,
    End = 2,
}

impl CommandPhase {
    #[inline]
    pub fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            0 => Some(Self::Begin),
            1 => Some(Self::Continue),
            2 => Some(Self::End),
            _ => None,
        }
    }
}

/// Identifies a handler added with [`Command::add_before`] or [`Command::add_after`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Rc<RefCell<dyn FnMut(CommandPhase) -> bool>>;

struct CommandCtx {
    before: RefCell<Vec<(HandlerId, Handler)>>,
    after: RefCell<Vec<(HandlerId, Handler)>>,
    next_id: Cell<u64>,
}

impl CommandCtx {
    #[inline]
    fn list(&self, before: bool) -> &RefCell<Vec<(HandlerId, Handler)>> {
        if before {
            &self.before
        } else {
            &self.after
        }
    }
}

thread_local! {
    static COMMANDS: CallbackArena<CommandCtx> = CallbackArena::new();
}

pub(crate) fn live_callbacks() -> usize {
    COMMANDS.with(|a| a.len())
}

/// Runs handlers in registration order. The host keeps processing the command only if every
/// handler asks it to; the first `false` stops the chain.
fn dispatch(refcon: Refcon, phase: c_int, before: bool) -> c_int {
    let Some(ctx) = COMMANDS.with(|a| a.resolve(refcon)) else {
        return 1;
    };
    let Some(phase) = CommandPhase::from_raw(phase) else {
        return 1;
    };
    let handlers: Vec<Handler> = ctx.list(before).borrow().iter().map(|(_, h)| h.clone()).collect();
    for handler in handlers {
        let Ok(mut f) = handler.try_borrow_mut() else {
            continue;
        };
        if !f(phase) {
            return 0;
        }
    }
    1
}

unsafe extern "C" fn command_before(_command: Handle, phase: c_int, refcon: Refcon) -> c_int {
    guard("command handler", 1, || dispatch(refcon, phase, true))
}

unsafe extern "C" fn command_after(_command: Handle, phase: c_int, refcon: Refcon) -> c_int {
    guard("command handler", 1, || dispatch(refcon, phase, false))
}

/// A host command.
///
/// Handlers share one native registration per side: it is installed with the first handler
/// and removed with the last one, or when the `Command` is dropped.
pub struct Command {
    id: CommandId,
    ctx: Rc<CommandCtx>,
    slot: CallbackId,
}

impl Command {
    fn wrap(id: CommandId) -> Self {
        let ctx = Rc::new(CommandCtx {
            before: RefCell::new(Vec::new()),
            after: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        });
        let slot = COMMANDS.with(|a| a.insert(ctx.clone()));
        Self { id, ctx, slot }
    }

    pub fn find(name: &str) -> Option<Self> {
        let name = to_cstring(name).ok()?;
        let raw = unsafe { (xplm().find_command)(name.as_ptr()) };
        CommandId::from_raw(raw).map(Self::wrap)
    }

    pub fn create(name: &str, description: &str) -> XplmResult<Self> {
        let name = to_cstring(name)?;
        let description = to_cstring(description)?;
        let raw = unsafe { (xplm().create_command)(name.as_ptr(), description.as_ptr()) };
        CommandId::from_raw(raw)
            .map(Self::wrap)
            .ok_or_else(|| XplmError::create_failed("command"))
    }

    #[inline]
    pub fn id(&self) -> CommandId {
        self.id
    }

    #[inline]
    pub fn begin(&self) {
        unsafe { (xplm().command_begin)(self.id.as_raw()) }
    }

    #[inline]
    pub fn end(&self) {
        unsafe { (xplm().command_end)(self.id.as_raw()) }
    }

    #[inline]
    pub fn once(&self) {
        unsafe { (xplm().command_once)(self.id.as_raw()) }
    }

    /// Runs before the host's own handling; returning `false` suppresses it.
    pub fn add_before(&self, handler: impl FnMut(CommandPhase) -> bool + 'static) -> HandlerId {
        self.add(true, Rc::new(RefCell::new(handler)))
    }

    pub fn add_after(&self, handler: impl FnMut(CommandPhase) -> bool + 'static) -> HandlerId {
        self.add(false, Rc::new(RefCell::new(handler)))
    }

    fn add(&self, before: bool, handler: Handler) -> HandlerId {
        let id = HandlerId(self.ctx.next_id.get());
        self.ctx.next_id.set(id.0 + 1);

        let first = self.ctx.list(before).borrow().is_empty();
        self.ctx.list(before).borrow_mut().push((id, handler));
        if first {
            self.register_native(before);
        }
        id
    }

    /// Returns `false` if the handler was not registered on this command.
    pub fn remove_handler(&self, id: HandlerId) -> bool {
        for before in [true, false] {
            let mut list = self.ctx.list(before).borrow_mut();
            let Some(pos) = list.iter().position(|(h, _)| *h == id) else {
                continue;
            };
            list.remove(pos);
            let now_empty = list.is_empty();
            drop(list);
            if now_empty {
                self.unregister_native(before);
            }
            return true;
        }
        false
    }

    #[inline]
    pub fn handler_count(&self) -> usize {
        self.ctx.before.borrow().len() + self.ctx.after.borrow().len()
    }

    fn register_native(&self, before: bool) {
        let trampoline = if before { command_before } else { command_after };
        unsafe {
            (xplm().register_command_handler)(
                self.id.as_raw(),
                Some(trampoline),
                before as c_int,
                self.slot.to_refcon(),
            )
        };
    }

    fn unregister_native(&self, before: bool) {
        let trampoline = if before { command_before } else { command_after };
        unsafe {
            (xplm().unregister_command_handler)(
                self.id.as_raw(),
                Some(trampoline),
                before as c_int,
                self.slot.to_refcon(),
            )
        };
    }
}

impl Drop for Command {
    fn drop(&mut self) {
        for before in [true, false] {
            let had = !self.ctx.list(before).borrow().is_empty();
            self.ctx.list(before).borrow_mut().clear();
            if had {
                self.unregister_native(before);
            }
        }
        COMMANDS.with(|a| a.remove(self.slot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;

    #[test]
    fn find_and_create() {
        let host = TestHost::new();
        host.define_command("sim/operation/pause_toggle");
        assert!(Command::find("sim/operation/pause_toggle").is_some());
        assert!(Command::find("sim/none").is_none());

        let created = Command::create("fbw/toggle_tcas", "Toggle TCAS override").unwrap();
        assert_eq!(Command::find("fbw/toggle_tcas").map(|c| c.id()), Some(created.id()));

        host.refuse_creation(true);
        assert!(matches!(
            Command::create("fbw/refused", ""),
            Err(XplmError::CreateFailed { what: "command" })
        ));
    }

    #[test]
    fn native_registration_is_lazy_and_released_with_last_handler() {
        let host = TestHost::new();
        let cmd = Command::create("fbw/test", "").unwrap();
        assert_eq!(host.command_registrations(cmd.id()), (0, 0));

        let a = cmd.add_before(|_| true);
        let b = cmd.add_before(|_| true);
        let c = cmd.add_after(|_| true);
        assert_eq!(host.command_registrations(cmd.id()), (1, 1));

        assert!(cmd.remove_handler(a));
        assert_eq!(host.command_registrations(cmd.id()), (1, 1));
        assert!(cmd.remove_handler(b));
        assert_eq!(host.command_registrations(cmd.id()), (0, 1));
        assert!(!cmd.remove_handler(b));

        drop(cmd);
        assert_eq!(host.calls("XPLMUnregisterCommandHandler"), 2);
        let _ = c;
    }

    #[test]
    fn before_handler_can_suppress_the_command() {
        let host = TestHost::new();
        let cmd = Command::create("fbw/gear", "").unwrap();
        let phases = Rc::new(RefCell::new(Vec::new()));

        let seen = phases.clone();
        let block = cmd.add_before(move |phase| {
            seen.borrow_mut().push(phase);
            false
        });
        let after_hits = Rc::new(Cell::new(0));
        let hits = after_hits.clone();
        cmd.add_after(move |_| {
            hits.set(hits.get() + 1);
            true
        });

        cmd.once();
        assert_eq!(*phases.borrow(), vec![CommandPhase::Begin, CommandPhase::End]);
        assert_eq!(host.command_executions("fbw/gear"), 0);
        assert_eq!(after_hits.get(), 0);

        cmd.remove_handler(block);
        cmd.begin();
        cmd.end();
        assert_eq!(host.command_executions("fbw/gear"), 1);
        assert_eq!(after_hits.get(), 2);
    }

    #[test]
    fn panicking_handler_lets_host_continue() {
        let host = TestHost::new();
        let cmd = Command::create("fbw/panics", "").unwrap();
        cmd.add_before(|_| panic!("handler bug"));
        cmd.once();
        assert_eq!(host.command_executions("fbw/panics"), 1);
        assert!(host.debug_log().contains("handler bug"));
    }

    #[test]
    fn handlers_may_remove_themselves() {
        let _host = TestHost::new();
        let cmd = Rc::new(Command::create("fbw/self_remove", "").unwrap());
        let slot: Rc<Cell<Option<HandlerId>>> = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&cmd);
        let id_slot = slot.clone();
        let id = cmd.add_after(move |_| {
            if let (Some(cmd), Some(id)) = (weak.upgrade(), id_slot.get()) {
                cmd.remove_handler(id);
            }
            true
        });
        slot.set(Some(id));

        cmd.once();
        assert_eq!(cmd.handler_count(), 0);
    }

    #[test]
    fn dropping_command_frees_its_context() {
        let _host = TestHost::new();
        let before = live_callbacks();
        let cmd = Command::create("fbw/ctx", "").unwrap();
        cmd.add_before(|_| true);
        assert_eq!(live_callbacks(), before + 1);
        drop(cmd);
        assert_eq!(live_callbacks(), before);
    }
}
