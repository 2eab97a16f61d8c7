//! HTML bodies for transactional email
//!
//! Every value that originates from a user is escaped with
//! `htmlescape::encode_minimal` before it is placed in markup. Links built by
//! the server are escaped as attributes.

use htmlescape::{encode_attribute, encode_minimal};
use rust_decimal::Decimal;

const BRAND: &str = "Nagai Agrotrade";

/// Wraps a rendered body in the shared layout
pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
</head>
<body style="margin:0;padding:0;background:#f4f6f3;font-family:Arial,Helvetica,sans-serif;color:#1f2a1f;">
<table role="presentation" width="100%" cellspacing="0" cellpadding="0">
<tr><td align="center" style="padding:24px;">
<table role="presentation" width="600" cellspacing="0" cellpadding="0" style="background:#ffffff;border-radius:8px;">
<tr><td style="padding:24px;background:#2e7d32;color:#ffffff;border-radius:8px 8px 0 0;font-size:20px;font-weight:bold;">{brand}</td></tr>
<tr><td style="padding:24px;font-size:15px;line-height:1.6;">
{body}
</td></tr>
<tr><td style="padding:16px 24px;font-size:12px;color:#6b776b;">&copy; {brand}. All rights reserved.</td></tr>
</table>
</td></tr>
</table>
</body>
</html>"#,
        title = encode_minimal(title),
        brand = BRAND,
        body = body,
    )
}

/// Escapes user text and keeps its line breaks
fn paragraphs(text: &str) -> String {
    text.lines()
        .map(encode_minimal)
        .collect::<Vec<_>>()
        .join("<br>")
}

/// Call-to-action button followed by the plain link for clients that strip buttons
fn button(label: &str, href: &str) -> String {
    format!(
        r#"<p style="margin:24px 0;"><a href="{}" style="background:#2e7d32;color:#ffffff;padding:12px 20px;border-radius:4px;text-decoration:none;">{}</a></p>
<p style="font-size:13px;color:#6b776b;word-break:break-all;">Or open this link: {}</p>"#,
        encode_attribute(href),
        encode_minimal(label),
        encode_minimal(href),
    )
}

pub fn signup_verification(username: &str, link: &str) -> String {
    let body = format!(
        "<p>Hello {},</p>\
         <p>Thanks for signing up. Confirm your email address to activate your account.</p>\
         {}\
         <p>The link expires in a few days. If you did not create an account you can ignore this email.</p>",
        encode_minimal(username),
        button("Verify email", link),
    );
    layout("Verify your email", &body)
}

pub fn reset_password(link: &str) -> String {
    let body = format!(
        "<p>We received a request to reset your password.</p>\
         {}\
         <p>If you did not ask for this, ignore this email and your password stays the same.</p>",
        button("Reset password", link),
    );
    layout("Reset your password", &body)
}

/// Details shown in a purchase confirmation
#[derive(Debug, Clone)]
pub struct PaymentSummary<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone_number: &'a str,
    pub address: &'a str,
    pub product: &'a str,
    pub quantity: i32,
    pub amount: Decimal,
    pub reference: &'a str,
}

pub fn payment_confirmation(summary: &PaymentSummary<'_>) -> String {
    let row = |label: &str, value: &str| {
        format!(
            r#"<tr><td style="padding:6px 12px 6px 0;color:#6b776b;">{}</td><td style="padding:6px 0;">{}</td></tr>"#,
            label,
            encode_minimal(value)
        )
    };
    let rows = [
        row("Name", summary.name),
        row("Email", summary.email),
        row("Phone", summary.phone_number),
        row("Address", summary.address),
        row("Product", summary.product),
        row("Units", &summary.quantity.to_string()),
        row("Amount", &format!("NGN {}", summary.amount)),
        row("Reference", summary.reference),
    ]
    .concat();
    let body = format!(
        "<p>Payment received. Here is a summary of the purchase.</p>\
         <table role=\"presentation\" cellspacing=\"0\" cellpadding=\"0\">{}</table>",
        rows
    );
    layout("Payment confirmation", &body)
}

/// A heading plus free text; used for ledger and staff notices
pub fn message(heading: &str, content: &str) -> String {
    let body = format!(
        "<h2 style=\"margin-top:0;\">{}</h2><p>{}</p>",
        encode_minimal(heading),
        paragraphs(content)
    );
    layout(heading, &body)
}

pub fn contact_us(fullname: &str, email: &str, phone_number: &str, text: &str) -> String {
    let body = format!(
        "<h2 style=\"margin-top:0;\">New contact request</h2>\
         <p><strong>Name:</strong> {}<br><strong>Email:</strong> {}<br><strong>Phone:</strong> {}</p>\
         <p>{}</p>",
        encode_minimal(fullname),
        encode_minimal(email),
        encode_minimal(phone_number),
        paragraphs(text),
    );
    layout("Contact us", &body)
}

pub fn broadcast(subject: &str, content: &str) -> String {
    layout(subject, &format!("<p>{}</p>", paragraphs(content)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_content_is_escaped() {
        let html = message("<script>alert(1)</script>", "Tom & Jerry <b>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Tom &amp; Jerry &lt;b&gt;"));
    }

    #[test]
    fn line_breaks_survive_escaping() {
        let html = broadcast("News", "first line\nsecond line");
        assert!(html.contains("first line<br>second line"));
    }

    #[test]
    fn verification_mail_carries_link() {
        let link = "http://localhost:5005/api/v1/user/account/verify/abc";
        let html = signup_verification("farmer", link);
        assert!(html.contains(link));
        assert!(html.contains("Hello farmer"));
    }

    #[test]
    fn payment_confirmation_lists_purchase() {
        let html = payment_confirmation(&PaymentSummary {
            name: "Ada",
            email: "ada@example.com",
            phone_number: "08012345678",
            address: "1 Farm Road",
            product: "Maize <premium>",
            quantity: 12,
            amount: Decimal::new(1_200_000, 2),
            reference: "ref_123",
        });
        assert!(html.contains("NGN 12000.00"));
        assert!(html.contains("Maize &lt;premium&gt;"));
        assert!(html.contains("ref_123"));
    }
}
