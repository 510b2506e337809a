use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use trueshift_core::{
    handlers, ApiClient, EndpointId, Form, Notification, Notifier, Outcome, Transport,
};

use crate::console::{self, ConsoleNotifier};

const HELP: &str = "\
Commands:
  list             show all endpoints
  <number|name>    fill in and send one endpoint, e.g. `3` or `auth.login`
  status           show whether a token is stored
  logout           forget the stored token
  help             show this text
  quit             leave the tester

While filling a form, press enter to keep a field's current value or
type `-` to clear it.";

/// Answer that resets a field to the empty string.
const CLEAR_FIELD: &str = "-";

/// One tester session: a shared client plus one live form per endpoint.
///
/// Forms are created on first use and kept, so values typed for an endpoint
/// are still there when the operator opens it again.
pub struct App<T> {
    client: ApiClient<T>,
    forms: HashMap<EndpointId, Form>,
    notifier: Arc<dyn Notifier>,
}

impl<T: Transport> App<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
        let forms = EndpointId::ALL
            .into_iter()
            .map(|id| (id, Form::new(id.descriptor(), notifier.clone())))
            .collect();
        Self {
            client,
            forms,
            notifier,
        }
    }

    fn form(&self, id: EndpointId) -> &Form {
        // Every catalog entry gets a form in `new`.
        &self.forms[&id]
    }

    pub fn print_endpoints(&self, out: &mut impl Write) -> anyhow::Result<()> {
        console::print_endpoints(out)?;
        Ok(())
    }

    pub fn print_status(&self, out: &mut impl Write) -> anyhow::Result<()> {
        writeln!(out, "Base URL: {}", self.client.base_url())?;
        writeln!(out, "{}", console::auth_badge(self.client.session()))?;
        Ok(())
    }

    pub fn logout(&self, out: &mut impl Write) -> anyhow::Result<()> {
        self.client
            .session()
            .clear()
            .context("token was dropped but its stored copy could not be removed")?;
        self.notifier
            .notify(Notification::success("Logged out successfully"));
        self.print_status(out)
    }

    /// Fills the endpoint's form from `name=value` pairs and sends it.
    pub async fn call(&self, id: EndpointId, pairs: &[String]) -> anyhow::Result<Outcome> {
        let form = self.form(id);
        for pair in pairs {
            let Some((name, value)) = pair.split_once('=') else {
                bail!("expected name=value, got '{pair}'");
            };
            form.set_field(name, value)?;
        }
        self.send(id).await
    }

    async fn send(&self, id: EndpointId) -> anyhow::Result<Outcome> {
        handlers::submit(self.form(id), &self.client, id, self.notifier.as_ref())
            .await
            .context("a request for this endpoint is already in flight")
    }

    pub async fn run_interactive<R>(&self, input: R, out: &mut impl Write) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        writeln!(out, "TrueShift API Tester")?;
        self.print_status(out)?;
        writeln!(out, "Type `help` for commands.")?;

        loop {
            write!(out, "> ")?;
            out.flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match line.trim() {
                "" => {}
                "quit" | "exit" => break,
                "help" => writeln!(out, "{HELP}")?,
                "list" => self.print_endpoints(out)?,
                "status" => self.print_status(out)?,
                "logout" => {
                    if let Err(e) = self.logout(out) {
                        writeln!(out, "logout: {e:#}")?;
                    }
                }
                other => match resolve(other) {
                    Some(id) => {
                        if !self.fill_form(id, &mut lines, out).await? {
                            break;
                        }
                        let outcome = self.send(id).await?;
                        console::print_outcome(out, &outcome)?;
                    }
                    None => writeln!(out, "unknown command: {other} (try `help`)")?,
                },
            }
        }
        Ok(())
    }

    /// Prompts for every field. A blank answer keeps the current value and
    /// [`CLEAR_FIELD`] empties it. Returns `false` if input ended before the form was complete.
    async fn fill_form<R>(
        &self,
        id: EndpointId,
        lines: &mut Lines<R>,
        out: &mut impl Write,
    ) -> anyhow::Result<bool>
    where
        R: AsyncBufRead + Unpin,
    {
        let form = self.form(id);
        console::print_header(out, id)?;
        for field in form.render() {
            write!(out, "{}", console::field_prompt(&field))?;
            out.flush()?;
            let value = if field.multiline {
                let mut collected = Vec::new();
                loop {
                    match lines.next_line().await? {
                        Some(line) if line.trim() == "." => break,
                        Some(line) => collected.push(line),
                        None => return Ok(false),
                    }
                }
                collected.join("\n")
            } else {
                match lines.next_line().await? {
                    Some(line) => line,
                    None => return Ok(false),
                }
            };
            match value.as_str() {
                "" => {}
                CLEAR_FIELD => form.set_field(field.name, "")?,
                other => form.set_field(field.name, other)?,
            }
        }
        Ok(true)
    }
}

/// Accepts a 1-based position in `EndpointId::ALL` or an endpoint slug.
fn resolve(input: &str) -> Option<EndpointId> {
    if let Ok(number) = input.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|i| EndpointId::ALL.get(i).copied());
    }
    input.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trueshift_core::{ApiError, MemoryTokenStorage, Session, TokenStorage, UreqTransport};

    // Nothing listens on the discard port, so every send fails fast.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    struct ReadOnlyStorage;

    impl TokenStorage for ReadOnlyStorage {
        fn load(&self) -> Result<Option<String>, ApiError> {
            Ok(Some("stale".to_string()))
        }
        fn save(&self, _token: &str) -> Result<(), ApiError> {
            Err(ApiError::StorageError("read-only".to_string()))
        }
        fn remove(&self) -> Result<(), ApiError> {
            Err(ApiError::StorageError("read-only".to_string()))
        }
    }

    fn app(storage: impl TokenStorage + 'static) -> App<UreqTransport> {
        let session = Arc::new(Session::load(storage).unwrap());
        App::new(ApiClient::new(UNREACHABLE, session, UreqTransport::new()))
    }

    async fn run(app: &App<UreqTransport>, input: &str) -> String {
        let mut out = Vec::new();
        app.run_interactive(input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn failed_logout_keeps_the_prompt_running() {
        let app = app(ReadOnlyStorage);
        let out = run(&app, "logout\nstatus\nquit\n").await;
        assert!(out.contains("logout: "), "{out}");
        assert!(out.contains("read-only"), "{out}");
        assert!(out.ends_with("🔒 Not Authenticated\n> "), "{out}");
    }

    #[tokio::test]
    async fn dash_clears_a_field_and_blank_keeps_it() {
        let app = app(MemoryTokenStorage::new());
        run(&app, "auth.login\na@b.com\nsecret\nauth.login\n\n-\nquit\n").await;
        let form = app.form(EndpointId::Login);
        assert_eq!(form.field("email").as_deref(), Some("a@b.com"));
        assert_eq!(form.field("password").as_deref(), Some(""));
        assert!(form.outcome().is_some_and(|outcome| !outcome.is_success()));
    }

    #[test]
    fn resolve_accepts_numbers_and_slugs() {
        assert_eq!(resolve("1"), Some(EndpointId::RegisterUser));
        assert_eq!(resolve("12"), Some(EndpointId::AllVerifications));
        assert_eq!(resolve("auth.login"), Some(EndpointId::Login));
        assert_eq!(resolve("0"), None);
        assert_eq!(resolve("13"), None);
        assert_eq!(resolve("dance"), None);
    }
}
