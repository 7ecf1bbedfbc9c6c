pub mod openai;

pub use openai::OpenAiClient;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion service responded with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("completion service returned an unreadable response: {0}")]
    MalformedResponse(String),
    #[error("completion service returned no message content")]
    EmptyReply,
}

pub trait CompletionService {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, ServiceError>;
}

impl<T: CompletionService + ?Sized> CompletionService for &T {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, ServiceError> {
        (**self).complete(system_prompt, user_prompt, temperature)
    }
}

impl<T: CompletionService + ?Sized> CompletionService for Box<T> {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, ServiceError> {
        (**self).complete(system_prompt, user_prompt, temperature)
    }
}
