use super::context::RuntimeContext;
use super::frontend::FrontendAdapter;
use super::mode::RuntimeMode;

pub struct Runtime<M: RuntimeMode> {
    pub mode: M,
}

impl<M: RuntimeMode> Runtime<M> {
    pub fn new(mode: M) -> Self {
        Self { mode }
    }

    /// Single-owner event loop: the frontend's input poll paces the loop (it
    /// blocks briefly), and every session mutation happens on this task, so
    /// frame ordering needs no synchronization.
    pub async fn run<F: FrontendAdapter<M>>(&mut self, frontend: &mut F, ctx: &mut RuntimeContext) {
        loop {
            frontend.render(&self.mode);
            if frontend.should_quit() || self.mode.quit_requested() {
                break;
            }

            if let Some(event) = frontend.poll_user_input(&self.mode) {
                self.mode.on_frontend_event(event, ctx);
            }

            for update in ctx.pump().await {
                self.mode.on_session_update(update, ctx);
            }
        }

        let mut discarded = Vec::new();
        ctx.session.stop(&mut discarded).await;
    }
}
