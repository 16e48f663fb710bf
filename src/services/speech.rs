//! Text-to-speech for the summary, via the Google Translate TTS endpoint.
//! The endpoint accepts at most 100 characters per request, so longer text
//! is split and the MP3 segments are concatenated.

use crate::config::SpeechConfig;
use crate::error::AppError;
use crate::models::AudioPayload;
use reqwest::Client as HttpClient;
use std::time::Duration;

const MAX_CHUNK_CHARS: usize = 100;

#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str) -> Result<AudioPayload, AppError>;
}

pub struct GoogleTts {
    api_url: String,
    lang: String,
    http_client: HttpClient,
}

impl GoogleTts {
    pub fn new(config: &SpeechConfig) -> Result<Self, AppError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64)")
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_url: config.api_url.clone(),
            lang: config.lang.clone(),
            http_client,
        })
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn speak(&self, text: &str) -> Result<AudioPayload, AppError> {
        let chunks = split_into_chunks(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(AppError::Synthesis("No text to speak".to_string()));
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let params = [
                ("ie", "UTF-8".to_string()),
                ("q", chunk.clone()),
                ("tl", self.lang.clone()),
                ("total", total.clone()),
                ("idx", idx.to_string()),
                ("textlen", chunk.chars().count().to_string()),
                ("client", "tw-ob".to_string()),
                ("ttsspeed", "1".to_string()),
            ];

            let response = self
                .http_client
                .get(&self.api_url)
                .query(&params)
                .send()
                .await
                .map_err(|e| AppError::Synthesis(format!("Failed to reach speech service: {}", e)))?;

            if !response.status().is_success() {
                return Err(AppError::Synthesis(format!(
                    "Speech service returned error {} for segment {}",
                    response.status(),
                    idx
                )));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| AppError::Synthesis(format!("Failed to read audio: {}", e)))?;
            audio.extend_from_slice(&bytes);
        }

        tracing::info!("Synthesized {} bytes of audio from {} segments", audio.len(), chunks.len());
        Ok(AudioPayload::mp3(audio))
    }
}

const PHRASE_END: [char; 6] = ['.', ',', ';', ':', '!', '?'];

/// Split text into chunks of at most `max_chars` characters. Phrases ending
/// in punctuation are kept whole when they fit; longer phrases fall back to
/// word boundaries, and words longer than the limit are cut.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for phrase in phrases(text) {
        let phrase_len = phrase.chars().count();
        let current_len = current.chars().count();

        if current_len > 0 && current_len + 1 + phrase_len <= max_chars {
            current.push(' ');
            current.push_str(&phrase);
            continue;
        }

        if current_len > 0 {
            chunks.push(std::mem::take(&mut current));
        }

        if phrase_len <= max_chars {
            current = phrase;
        } else {
            let mut pieces = pack_words(&phrase, max_chars);
            current = pieces.pop().unwrap_or_default();
            chunks.extend(pieces);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Runs of words ending at punctuation that is followed by whitespace
fn phrases(text: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut words: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        words.push(word);
        if word.ends_with(PHRASE_END) {
            phrases.push(words.join(" "));
            words.clear();
        }
    }
    if !words.is_empty() {
        phrases.push(words.join(" "));
    }
    phrases
}

fn pack_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();

        if current_len > 0 && current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            continue;
        }

        if current_len > 0 {
            chunks.push(std::mem::take(&mut current));
        }

        if word_len <= max_chars {
            current.push_str(word);
        } else {
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(max_chars).map(|c| c.iter().collect::<String>()).peekable();
            while let Some(piece) = pieces.next() {
                if pieces.peek().is_some() {
                    chunks.push(piece);
                } else {
                    current = piece;
                }
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tts(server: &MockServer) -> GoogleTts {
        GoogleTts::new(&SpeechConfig {
            api_url: format!("{}/translate_tts", server.uri()),
            lang: "en".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_split_short_text() {
        assert_eq!(split_into_chunks("Two patients found.", 100), vec!["Two patients found."]);
        assert!(split_into_chunks("   \n ", 100).is_empty());
    }

    #[test]
    fn test_split_respects_limit() {
        let text = "Alice is 45 and has the flu. Dan is 51 and has asthma. Carol is 67 and also has the flu, treated by Dr. Grey.";
        let chunks = split_into_chunks(text, 40);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_split_prefers_phrase_breaks() {
        let text = "Alice is 45 and has the flu. Dan is 51 and has asthma. Carol is 67 and also has the flu, treated by Dr. Grey.";
        let chunks = split_into_chunks(text, 40);
        assert_eq!(
            chunks,
            vec![
                "Alice is 45 and has the flu.",
                "Dan is 51 and has asthma.",
                "Carol is 67 and also has the flu,",
                "treated by Dr. Grey.",
            ]
        );
    }

    #[test]
    fn test_split_merges_short_phrases() {
        let chunks = split_into_chunks("Yes. Two rows. Both flu.", 100);
        assert_eq!(chunks, vec!["Yes. Two rows. Both flu."]);
    }

    #[test]
    fn test_split_long_word() {
        let word = "a".repeat(250);
        let chunks = split_into_chunks(&format!("{} end", word), 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1].len(), 100);
        assert_eq!(chunks[2], format!("{} end", "a".repeat(50)));
    }

    #[tokio::test]
    async fn test_speak_concatenates_segments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("idx", "0"))
            .and(query_param("tl", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("idx", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![3u8]))
            .mount(&server)
            .await;

        let text = format!("{} {}", "word ".repeat(19).trim(), "tail ".repeat(10).trim());
        let audio = tts(&server).speak(&text).await.unwrap();
        assert_eq!(audio.bytes, vec![1, 2, 3]);
        assert_eq!(audio.mime_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn test_speak_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = tts(&server).speak("hello").await.unwrap_err();
        assert!(matches!(err, AppError::Synthesis(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_speak_empty_text() {
        let server = MockServer::start().await;
        let err = tts(&server).speak("  ").await.unwrap_err();
        assert!(matches!(err, AppError::Synthesis(_)));
    }
}
