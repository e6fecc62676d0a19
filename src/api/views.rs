use askama::Template;

use crate::telemetry::models::Relay;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage<'a> {
    pub error: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage<'a> {
    pub email: &'a str,
    pub event_log: bool,
    pub relays: [Relay; 3],
}

impl<'a> DashboardPage<'a> {
    pub fn new(email: &'a str, event_log: bool) -> Self {
        Self {
            email,
            event_log,
            relays: Relay::ALL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_page_shows_error_when_set() {
        let html = LoginPage {
            error: Some("Invalid credentials. Try again."),
        }
        .render()
        .unwrap();
        assert!(html.contains("Invalid credentials. Try again."));
        assert!(html.contains(r#"action="/login""#));
    }

    #[test]
    fn login_page_without_error_has_no_message() {
        let html = LoginPage { error: None }.render().unwrap();
        assert!(!html.contains("Invalid credentials"));
    }

    #[test]
    fn dashboard_lists_relays_and_optional_log() {
        let html = DashboardPage::new("ada@example.com", true).render().unwrap();
        for relay in Relay::ALL {
            assert!(html.contains(&format!(r#"data-relay="{relay}""#)));
        }
        assert!(html.contains(r#"id="event-log""#));

        let html = DashboardPage::new("ada@example.com", false).render().unwrap();
        assert!(!html.contains(r#"id="event-log""#));
    }
}
