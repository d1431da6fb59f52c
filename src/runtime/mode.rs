use super::context::RuntimeContext;
use super::frontend::UserInputEvent;
use super::update::UiUpdate;

pub trait RuntimeMode {
    fn on_frontend_event(&mut self, event: UserInputEvent, ctx: &mut RuntimeContext);
    fn on_session_update(&mut self, update: UiUpdate, ctx: &mut RuntimeContext);
    fn quit_requested(&self) -> bool;
}
