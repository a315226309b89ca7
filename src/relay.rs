use actix_web::{post, web, HttpResponse};
use bytes::Bytes;
use futures_util::StreamExt;
use log::{debug, error, info};
use reqwest::Client;
use serde_json::json;

use crate::config::OpenAiConfig;
use crate::error::ChatError;
use crate::message::{contact_reply, ChatRequest, Message, UserInput};
use crate::sse::{EventStreamDecoder, StreamEvent};
use crate::AppState;

/// Persona and behavior instructions prepended to every completion request.
pub const SYSTEM_PROMPT: &str = "Você é um assistente especializado na Punch Conteúdo, \
uma produtora criativa focada em educação corporativa para grandes empresas. Forneça \
respostas concisas, geralmente 2-3 frases. Use tags [highlight] ao redor das partes mais \
importantes da sua resposta. Ao mencionar itens do portfólio ou exemplos do trabalho da \
Punch Conteúdo, sempre use tags [portfolio=VIDEO_ID], onde VIDEO_ID é o ID do vídeo no \
Vimeo. Exemplos:\n\n\
- Reel da Punch: [portfolio=754713544]\n\
- Grupo Boticário - NPS: [portfolio=774771860]\n\
- Empreendedoras da Beleza: [portfolio=844245615]\n\
- Making of Empreendedoras da Beleza: [portfolio=835540097]\n\
- XP Inc. Entrevista Benchimol: [portfolio=690648788]\n\
- Sonhos - XP Inc.: [portfolio=583171837]\n\
- Teaser Videoaula XP Inc.: [portfolio=583177882]\n\n\
Tente incluir pelo menos um link de portfólio em suas respostas ao discutir os projetos \
ou capacidades da Punch Conteúdo. Quando mencionar um projeto, inclua sua descrição \
relevante.\n\n\
Informações de contato da Punch Conteúdo:\n\
Quando o usuário pedir para entrar em contato ou demonstrar interesse nos serviços, \
instrua-o a usar o comando /whatsapp seguido do número de telefone com DDD para abrir \
uma conversa direta no WhatsApp.\n\n\
Exemplo: Para entrar em contato conosco via WhatsApp, digite '/whatsapp' seguido do seu \
número de telefone com DDD. Por exemplo: /whatsapp11987654321";

/// Messages sent upstream: the persona instruction followed by the incoming
/// transcript, verbatim and in order.
pub fn upstream_messages(transcript: &[Message]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(transcript.len() + 1);
    messages.push(Message::system(SYSTEM_PROMPT));
    messages.extend_from_slice(transcript);
    messages
}

async fn send_completion_request(
    client: &Client,
    config: &OpenAiConfig,
    transcript: &[Message],
) -> Result<reqwest::Response, ChatError> {
    debug!("Requesting completion for {} messages", transcript.len());
    let response = client
        .post(&config.api_url)
        .header("Authorization", format!("Bearer {}", config.api_key))
        .json(&json!({
            "model": config.model,
            "messages": upstream_messages(transcript),
            "stream": true,
        }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        error!("Chat API failed: status={}, error={}", status, error_text);
        return Err(ChatError::Upstream(format!(
            "Chat API failed: {}",
            status
        )));
    }
    Ok(response)
}

/// Translates the provider's event stream into a plain byte stream of deltas.
/// A mid-stream transport error or the `[DONE]` sentinel ends the body; the
/// consumer sees end-of-stream only through the transport itself.
fn relay_stream(
    response: reqwest::Response,
) -> impl futures_util::Stream<Item = Result<Bytes, ChatError>> {
    async_stream::stream! {
        let mut decoder = EventStreamDecoder::new();
        let mut upstream = response.bytes_stream();
        'upstream: while let Some(chunk) = upstream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    error!("Upstream stream error: {}", e);
                    break;
                }
            };
            for event in decoder.feed(&chunk) {
                match event {
                    StreamEvent::Delta(text) => yield Ok::<Bytes, ChatError>(Bytes::from(text)),
                    StreamEvent::Done => break 'upstream,
                }
            }
        }
    }
}

fn error_response() -> HttpResponse {
    HttpResponse::InternalServerError()
        .json(json!({ "error": "An error occurred while processing your request." }))
}

#[post("/api/chat")]
pub async fn chat(state: web::Data<AppState>, req: web::Json<ChatRequest>) -> HttpResponse {
    let messages = req.into_inner().messages;
    info!("Received /api/chat request: {} messages", messages.len());

    let Some(last) = messages.last() else {
        error!("Rejected /api/chat request with empty transcript");
        return HttpResponse::BadRequest()
            .json(json!({ "error": "messages must not be empty" }));
    };

    if let UserInput::ContactRequest { phone } = UserInput::parse(&last.content) {
        info!("Contact request intercepted, phone={}", phone);
        return HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(contact_reply(phone));
    }

    let response =
        match send_completion_request(&state.http, &state.config.openai, &messages).await {
            Ok(response) => response,
            Err(e) => {
                error!("Completion request failed: {}", e);
                return error_response();
            }
        };

    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .streaming(relay_stream(response))
}
