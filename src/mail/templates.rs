use crate::observer::event::ActivityEvent;

use super::EmailMessage;

const SUBJECT_PREFIX: &str = "[DocVault]";

/// One-line summary, e.g. `Dana Scully moved to trash folder "Invoices"`
pub fn activity_title(event: &ActivityEvent) -> String {
    format!(
        "{} {} {} \"{}\"",
        event.actor.name,
        event.action.verb(),
        event.action.entity(),
        event.entity_name
    )
}

/// Plain-text body shared by in-app notifications and emails
pub fn activity_body(event: &ActivityEvent) -> String {
    let mut lines = vec![format!("{}.", activity_title(event))];

    if let Some(tenant) = &event.tenant_name {
        lines.push(format!("Organization: {}", tenant));
    }
    lines.push(format!("By: {} <{}>", event.actor.name, event.actor.email));
    lines.push(format!("When: {}", event.occurred_at.format("%Y-%m-%d %H:%M:%S UTC")));

    if let Some(details) = event.details.as_object() {
        let mut keys: Vec<&String> = details.keys().collect();
        keys.sort();
        for key in keys {
            let value = &details[key];
            let rendered = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            lines.push(format!("{}: {}", key, rendered));
        }
    }

    lines.join("\n")
}

pub fn render_activity_email(event: &ActivityEvent, from: &str, to: &str) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: format!("{} {}", SUBJECT_PREFIX, activity_title(event)),
        text: format!(
            "{}\n\nYou receive this message because you administer this organization. \
             Email notifications can be turned off in your profile.",
            activity_body(event)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_event;
    use crate::types::ActivityAction;
    use serde_json::json;

    #[test]
    fn title_names_actor_verb_and_entity() {
        let event = sample_event(ActivityAction::FolderTrashed, "Invoices");
        assert_eq!(activity_title(&event), "Dana Scully moved to trash folder \"Invoices\"");
    }

    #[test]
    fn body_lists_details_in_key_order() {
        let event = sample_event(ActivityAction::DocumentMoved, "q1.pdf")
            .with_details(json!({ "to_folder": "Archive", "from_folder": "Inbox" }));
        let body = activity_body(&event);

        let from = body.find("from_folder: Inbox").unwrap();
        let to = body.find("to_folder: Archive").unwrap();
        assert!(from < to);
        assert!(body.contains("Organization: Acme Corp"));
        assert!(body.contains("By: Dana Scully <dana@acme.test>"));
    }

    #[test]
    fn email_carries_prefixed_subject() {
        let event = sample_event(ActivityAction::DocumentCreated, "q1.pdf");
        let message = render_activity_email(&event, "noreply@docvault.test", "admin@acme.test");
        assert_eq!(message.subject, "[DocVault] Dana Scully created document \"q1.pdf\"");
        assert_eq!(message.to, "admin@acme.test");
        assert!(message.text.starts_with("Dana Scully created document \"q1.pdf\"."));
    }
}
