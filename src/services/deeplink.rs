//! WhatsApp and email deep links
//!
//! Form responses carry links that reopen the conversation in WhatsApp or
//! the visitor's mail client with the submitted details filled in.

use crate::config::ContactConfig;
use serde::Serialize;

/// `https://wa.me/<digits>?text=<message>`; everything but digits is
/// stripped from the number
pub fn whatsapp_link(number: &str, message: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    format!(
        "https://wa.me/{}?text={}",
        digits,
        urlencoding::encode(message)
    )
}

/// `mailto:<address>?subject=<subject>&body=<body>`
pub fn mailto_link(address: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        address.trim(),
        urlencoding::encode(subject),
        urlencoding::encode(body)
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactLinks {
    pub whatsapp: String,
    pub email: String,
}

impl ContactLinks {
    /// Links to the business' own channels carrying the same message
    pub fn build(contact: &ContactConfig, subject: &str, message: &str) -> Self {
        Self {
            whatsapp: whatsapp_link(&contact.whatsapp_number, message),
            email: mailto_link(&contact.email, subject, message),
        }
    }
}

/// Message body for a product inquiry
pub fn product_inquiry_message(
    name: &str,
    product: Option<&str>,
    quantity: Option<&str>,
    unit: Option<&str>,
) -> String {
    let mut message = format!("Hello, I am {name}.");
    match product {
        Some(product) => message.push_str(&format!(" I am interested in {product}.")),
        None => message.push_str(" I am interested in your products."),
    }
    match (quantity, unit) {
        (Some(quantity), Some(unit)) => message.push_str(&format!(" Quantity: {quantity} {unit}.")),
        (Some(quantity), None) => message.push_str(&format!(" Quantity: {quantity}.")),
        _ => {}
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_whatsapp_link() {
        assert_eq!(
            whatsapp_link("+91 98765-43210", "Hi there & welcome"),
            "https://wa.me/919876543210?text=Hi%20there%20%26%20welcome"
        );
    }

    #[test]
    fn test_mailto_link() {
        assert_eq!(
            mailto_link("sales@example.com", "Inquiry: Cumin", "500 kg?"),
            "mailto:sales@example.com?subject=Inquiry%3A%20Cumin&body=500%20kg%3F"
        );
    }

    #[test]
    fn test_product_inquiry_message() {
        assert_eq!(
            product_inquiry_message("Asha", Some("Cumin Seeds"), Some("500"), Some("kg")),
            "Hello, I am Asha. I am interested in Cumin Seeds. Quantity: 500 kg."
        );
        assert_eq!(
            product_inquiry_message("Asha", None, Some("2"), None),
            "Hello, I am Asha. I am interested in your products. Quantity: 2."
        );
    }

    #[test]
    fn test_contact_links() {
        let contact = ContactConfig {
            whatsapp_number: "+91 291 000 1111".into(),
            email: "trade@example.com".into(),
        };
        let links = ContactLinks::build(&contact, "Hello", "Need guar gum");
        assert_eq!(links.whatsapp, "https://wa.me/912910001111?text=Need%20guar%20gum");
        assert_eq!(
            links.email,
            "mailto:trade@example.com?subject=Hello&body=Need%20guar%20gum"
        );
    }

    proptest! {
        #[test]
        fn whatsapp_text_round_trips(message in "\\PC{0,60}") {
            let link = whatsapp_link("+1 555 0100", &message);
            let (_, text) = link.split_once("?text=").unwrap();
            prop_assert_eq!(urlencoding::decode(text).unwrap(), message);
        }

        #[test]
        fn whatsapp_number_is_digits_only(number in "[+0-9 ()-]{0,20}") {
            let link = whatsapp_link(&number, "x");
            let path = link.trim_start_matches("https://wa.me/");
            let (digits, _) = path.split_once('?').unwrap();
            prop_assert!(digits.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
