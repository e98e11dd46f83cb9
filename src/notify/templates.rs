//! Account lifecycle email bodies

use super::Notification;
use crate::types::PendingUser;

const FOOTER: &str = "<p><small>Este es un email automático del sistema Buffet Turnos.</small></p>";

/// Minimal HTML escaping for user-supplied values
pub(crate) fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn today() -> String {
    chrono::Local::now().format("%d/%m/%Y %H:%M").to_string()
}

/// Review request sent to the administrator, with accept/deny links
pub fn review_request(
    admin_email: &str,
    pending: &PendingUser,
    accept_link: &str,
    deny_link: &str,
) -> Notification {
    let html = format!(
        r#"<h2>Nueva solicitud de registro</h2>
<p><strong>DNI:</strong> {dni}</p>
<p><strong>Nombre:</strong> {name}</p>
<p><strong>Email:</strong> {email}</p>
<p><strong>Fecha:</strong> {date}</p>
<h3>Acciones:</h3>
<p>
  <a href="{accept_link}">Aprobar cuenta</a>
  <a href="{deny_link}">Denegar cuenta</a>
</p>
{FOOTER}"#,
        dni = escape(&pending.dni),
        name = escape(&pending.display_name()),
        email = escape(&pending.email),
        date = today(),
    );

    Notification {
        to: admin_email.to_string(),
        subject: "Nueva Solicitud de Registro - Buffet Turnos".to_string(),
        html,
    }
}

/// Confirmation sent to the applicant right after registering
pub fn registration_received(pending: &PendingUser) -> Notification {
    let html = format!(
        r#"<h2>¡Solicitud Recibida!</h2>
<p>Hola <strong>{first_name}</strong>,</p>
<p>Tu solicitud de registro fue recibida y está pendiente de aprobación.</p>
<p><strong>DNI:</strong> {dni}</p>
<p>Recibirás un email cuando el administrador revise tu cuenta.</p>
{FOOTER}"#,
        first_name = escape(&pending.first_name),
        dni = escape(&pending.dni),
    );

    Notification {
        to: pending.email.clone(),
        subject: "Solicitud de Registro Recibida - Buffet Turnos".to_string(),
        html,
    }
}

/// Sent when the administrator accepts the registration
pub fn account_approved(pending: &PendingUser, login_url: &str) -> Notification {
    let html = format!(
        r#"<h2>¡Tu cuenta fue aprobada!</h2>
<p>Hola <strong>{name}</strong>,</p>
<p>Tu solicitud de registro fue <strong>APROBADA</strong>.</p>
<p><strong>DNI:</strong> {dni}</p>
<p>Ya podés iniciar sesión y solicitar tus turnos para el buffet.</p>
<p><a href="{login_url}">Iniciar sesión</a></p>
{FOOTER}"#,
        name = escape(&pending.display_name()),
        dni = escape(&pending.dni),
    );

    Notification {
        to: pending.email.clone(),
        subject: "Cuenta Aprobada - Buffet Turnos".to_string(),
        html,
    }
}

/// Sent when the administrator denies the registration
pub fn account_denied(pending: &PendingUser) -> Notification {
    let html = format!(
        r#"<h2>Solicitud de registro rechazada</h2>
<p>Hola <strong>{name}</strong>,</p>
<p>Tu solicitud de registro fue <strong>RECHAZADA</strong>.</p>
<p><strong>DNI:</strong> {dni}</p>
<p><strong>Fecha:</strong> {date}</p>
<p>Si creés que es un error, contactá a la administración.</p>
{FOOTER}"#,
        name = escape(&pending.display_name()),
        dni = escape(&pending.dni),
        date = today(),
    );

    Notification {
        to: pending.email.clone(),
        subject: "Solicitud Rechazada - Buffet Turnos".to_string(),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PendingUser {
        PendingUser {
            dni: "123".to_string(),
            first_name: "<Ana>".to_string(),
            last_name: "Diaz".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "h".to_string(),
            verification_token: "tok".to_string(),
            requested_at: 0,
        }
    }

    #[test]
    fn test_review_request_contains_links() {
        let n = review_request(
            "admin@example.com",
            &pending(),
            "http://x/auth/review/tok/accept",
            "http://x/auth/review/tok/deny",
        );
        assert_eq!(n.to, "admin@example.com");
        assert!(n.html.contains("http://x/auth/review/tok/accept"));
        assert!(n.html.contains("http://x/auth/review/tok/deny"));
    }

    #[test]
    fn test_user_values_are_escaped() {
        let n = registration_received(&pending());
        assert!(n.html.contains("&lt;Ana&gt;"));
        assert!(!n.html.contains("<Ana>"));
    }

    #[test]
    fn test_lifecycle_mails_go_to_applicant() {
        assert_eq!(account_approved(&pending(), "http://x/").to, "ana@example.com");
        assert_eq!(account_denied(&pending()).to, "ana@example.com");
    }
}
