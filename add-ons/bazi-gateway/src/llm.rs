//! NLP delegation: extracts a birth instant and gender from a free-text
//! query through an OpenAI-compatible chat endpoint.
//!
//! Only the user's query goes out; the chart itself is always computed
//! locally. API key: `BAZI_LLM_API_KEY` in `.env`. Mock mode falls back to
//! a local pattern extractor so tests and keyless deployments stay offline.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const EXTRACT_PROMPT: &str = "你是出生信息解析器。从用户的话中提取出生日期、时间和性别，\
    只输出一个 JSON 对象，不要输出其他文字：\
    {\"year\":1990,\"month\":5,\"day\":15,\"hour\":14,\"minute\":30,\"gender\":\"男\"}。\
    小时用 24 小时制；无法确定分钟时用 0。";

#[derive(Debug, Error)]
pub enum NlpError {
    /// The query reached a backend (or the local extractor) but no usable
    /// birth information came out of it.
    #[error("could not extract birth information: {0}")]
    Unusable(String),

    /// The configured LLM endpoint could not be reached or answered badly.
    #[error("NLP backend failed: {0}")]
    Transport(String),
}

/// The parameter tuple recovered from a query, echoed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedBirth {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    pub gender: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Chat client for birth-info extraction. `api_key: None` forces mock mode.
pub struct NlpClient {
    api_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl NlpClient {
    pub fn new(api_url: String, model: String, live: bool) -> Self {
        let api_key = if live {
            std::env::var("BAZI_LLM_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        } else {
            None
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_url,
            model,
            api_key,
            client,
        }
    }

    pub fn is_mock(&self) -> bool {
        self.api_key.is_none()
    }

    pub async fn extract_birth(&self, query: &str) -> Result<ExtractedBirth, NlpError> {
        match &self.api_key {
            Some(key) => self.extract_live(key, query).await,
            None => Self::extract_local(query),
        }
    }

    /// Pattern-based fallback extractor: handles `1990年5月15日下午2点30分`
    /// and `1990-05-15 14:30` shapes plus a gender word.
    fn extract_local(query: &str) -> Result<ExtractedBirth, NlpError> {
        let date_zh = Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})[日号]").unwrap();
        let date_iso = Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").unwrap();
        let caps = date_zh
            .captures(query)
            .or_else(|| date_iso.captures(query))
            .ok_or_else(|| NlpError::Unusable("no birth date found".into()))?;
        let year: i32 = caps[1].parse().map_err(|_| NlpError::Unusable("bad year".into()))?;
        let month: u32 = caps[2].parse().map_err(|_| NlpError::Unusable("bad month".into()))?;
        let day: u32 = caps[3].parse().map_err(|_| NlpError::Unusable("bad day".into()))?;

        let clock = Regex::new(r"(\d{1,2}):(\d{2})").unwrap();
        let hour_zh = Regex::new(r"(\d{1,2})[点时]").unwrap();
        let minute_zh = Regex::new(r"[点时](\d{1,2})分").unwrap();
        let (mut hour, minute) = if let Some(c) = clock.captures(query) {
            (
                c[1].parse().unwrap_or(0),
                c[2].parse().unwrap_or(0),
            )
        } else if let Some(c) = hour_zh.captures(query) {
            let m = minute_zh
                .captures(query)
                .and_then(|c| c[1].parse().ok())
                .unwrap_or(0);
            (c[1].parse().unwrap_or(0), m)
        } else {
            (0, 0)
        };
        if (query.contains("下午") || query.contains("晚上")) && hour < 12 {
            hour += 12;
        }

        let gender = if query.contains('女') || query.to_ascii_lowercase().contains("female") {
            "女"
        } else if query.contains('男') || query.to_ascii_lowercase().contains("male") {
            "男"
        } else {
            return Err(NlpError::Unusable("no gender found".into()));
        };

        Ok(ExtractedBirth {
            year,
            month,
            day,
            hour,
            minute,
            gender: gender.to_string(),
        })
    }

    async fn extract_live(&self, key: &str, query: &str) -> Result<ExtractedBirth, NlpError> {
        let url = format!("{}/chat/completions", self.api_url);
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: EXTRACT_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: query.to_string(),
                },
            ],
            temperature: Some(0.0),
            max_tokens: Some(256),
        };

        let res = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| NlpError::Transport(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(NlpError::Transport(format!("API error {status}: {body}")));
        }

        let parsed: ChatResponse = res
            .json()
            .await
            .map_err(|e| NlpError::Transport(format!("response parse failed: {e}")))?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim())
            .unwrap_or_default();
        // Models often wrap the JSON in a code fence.
        let content = content
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        serde_json::from_str(content)
            .map_err(|e| NlpError::Unusable(format!("unparseable extraction '{content}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_client() -> NlpClient {
        NlpClient::new("http://unused.invalid".into(), "unused".into(), false)
    }

    #[tokio::test]
    async fn mock_extracts_chinese_query() {
        let client = mock_client();
        assert!(client.is_mock());
        let b = client
            .extract_birth("我是1990年5月15日下午2点30分出生的男性")
            .await
            .unwrap();
        assert_eq!((1990, 5, 15, 14, 30), (b.year, b.month, b.day, b.hour, b.minute));
        assert_eq!("男", b.gender);
    }

    #[tokio::test]
    async fn mock_extracts_iso_query() {
        let b = mock_client()
            .extract_birth("1992-08-03 07:45 出生，女")
            .await
            .unwrap();
        assert_eq!((1992, 8, 3, 7, 45), (b.year, b.month, b.day, b.hour, b.minute));
        assert_eq!("女", b.gender);
    }

    #[tokio::test]
    async fn mock_rejects_queries_without_a_date() {
        let err = mock_client().extract_birth("男，属马").await.unwrap_err();
        assert!(matches!(err, NlpError::Unusable(_)));
    }

    #[tokio::test]
    async fn morning_hours_stay_untouched() {
        let b = mock_client()
            .extract_birth("1988年2月10日上午9点，女孩")
            .await
            .unwrap();
        assert_eq!(9, b.hour);
        assert_eq!(0, b.minute);
    }
}
