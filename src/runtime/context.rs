use crate::session::ToplevelSession;

use super::update::UiUpdate;

/// A side effect the mode wants performed against the toplevel. Mode
/// callbacks are synchronous; requests queue here and the runtime flushes
/// them (with the awaits they need) once the callback returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRequest {
    Submit(String),
    Interrupt,
    Stop,
    Reset,
}

pub struct RuntimeContext {
    pub session: ToplevelSession,
    requests: Vec<SessionRequest>,
}

impl RuntimeContext {
    pub fn new(session: ToplevelSession) -> Self {
        Self {
            session,
            requests: Vec::new(),
        }
    }

    pub fn submit(&mut self, source: String) {
        self.requests.push(SessionRequest::Submit(source));
    }

    pub fn interrupt(&mut self) {
        self.requests.push(SessionRequest::Interrupt);
    }

    pub fn stop(&mut self) {
        self.requests.push(SessionRequest::Stop);
    }

    pub fn reset(&mut self) {
        self.requests.push(SessionRequest::Reset);
    }

    #[cfg(test)]
    pub fn pending_requests(&self) -> &[SessionRequest] {
        &self.requests
    }

    /// Flush queued requests and drain whatever the toplevel produced since
    /// the last tick. Updates come back in the order their causes occurred.
    pub async fn pump(&mut self) -> Vec<UiUpdate> {
        let mut updates = Vec::new();
        for request in std::mem::take(&mut self.requests) {
            match request {
                SessionRequest::Submit(source) => {
                    if let Err(error) = self.session.submit(&source, &mut updates).await {
                        updates.push(UiUpdate::Warning(format!("{error:#}")));
                    }
                }
                SessionRequest::Interrupt => {
                    if let Err(error) = self.session.interrupt() {
                        updates.push(UiUpdate::Warning(format!("{error:#}")));
                    }
                }
                SessionRequest::Stop => self.session.stop(&mut updates).await,
                SessionRequest::Reset => {
                    if let Err(error) = self.session.reset(&mut updates).await {
                        updates.push(UiUpdate::Warning(format!("{error:#}")));
                    }
                }
            }
        }
        self.session.drain_output(&mut updates).await;
        updates
    }
}
