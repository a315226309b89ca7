use serde::{Deserialize, Serialize};

/// WhatsApp number the contact link points at.
const CONTACT_NUMBER: &str = "5511948878572";

/// Literal token that turns a user message into a contact request.
const CONTACT_COMMAND: &str = "/whatsapp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Message {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Message {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Message {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Body of a `POST /api/chat` request: the full transcript so far.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

/// A user message, classified once at the boundary. Both the relay and any
/// display layer go through this parser instead of re-checking the prefix.
#[derive(Debug, PartialEq, Eq)]
pub enum UserInput<'a> {
    Ordinary(&'a str),
    /// `/whatsapp` followed by a phone number. The number is taken verbatim
    /// after trimming; no format validation.
    ContactRequest { phone: &'a str },
}

impl<'a> UserInput<'a> {
    pub fn parse(content: &'a str) -> UserInput<'a> {
        match content.strip_prefix(CONTACT_COMMAND) {
            Some(rest) => UserInput::ContactRequest { phone: rest.trim() },
            None => UserInput::Ordinary(content),
        }
    }
}

/// Deep link opening a WhatsApp conversation with the canned greeting. The
/// greeting is pre-encoded in the template; the phone number is interpolated
/// verbatim.
pub fn whatsapp_link(phone: &str) -> String {
    format!(
        "https://wa.me/{CONTACT_NUMBER}?text=Olá,%20meu%20número%20é%20{phone}.\
%20Gostaria%20de%20mais%20informações%20sobre%20os%20serviços%20da%20Punch%20Conteúdo."
    )
}

/// Canned relay response for a contact request.
pub fn contact_reply(phone: &str) -> String {
    format!(
        "Clique no link a seguir para iniciar uma conversa no WhatsApp: {}",
        whatsapp_link(phone)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ordinary_message() {
        assert_eq!(
            UserInput::parse("Quais serviços vocês oferecem?"),
            UserInput::Ordinary("Quais serviços vocês oferecem?")
        );
    }

    #[test]
    fn parse_contact_request_trims_whitespace() {
        assert_eq!(
            UserInput::parse("/whatsapp 11987654321 "),
            UserInput::ContactRequest {
                phone: "11987654321"
            }
        );
    }

    #[test]
    fn parse_contact_request_accepts_any_trailing_text() {
        assert_eq!(
            UserInput::parse("/whatsapp not-a-number at all"),
            UserInput::ContactRequest {
                phone: "not-a-number at all"
            }
        );
    }

    #[test]
    fn command_must_be_a_prefix() {
        assert_eq!(
            UserInput::parse("ligue /whatsapp 11987654321"),
            UserInput::Ordinary("ligue /whatsapp 11987654321")
        );
    }

    #[test]
    fn contact_reply_embeds_phone_verbatim() {
        let reply = contact_reply("11987654321");
        assert!(reply.contains("https://wa.me/5511948878572?text="));
        assert!(reply.contains("11987654321"));
    }

    #[test]
    fn roles_serialize_lowercase() {
        let msg = Message::user("oi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "oi");
    }
}
