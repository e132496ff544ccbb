use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::detection::infrastructure::gemini_config::GeminiConfig;
use crate::shared::encoded_frame::EncodedFrame;
use crate::shared::face::DetectedFace;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DETECTION_PROMPT: &str = "Analyze the provided image to detect all human faces. \
For each face found, determine the perceived gender (male or female). Provide the output \
as a JSON array. Each element in the array should be an object representing a single face, \
containing two keys: 'gender' and 'boundingBox'. The 'boundingBox' should be an object with \
'x', 'y', 'width', and 'height' keys, representing the normalized coordinates (from 0.0 to \
1.0) of the box around the face. If no faces are found, return an empty array. Respond ONLY \
with the JSON array.";

/// Face detector backed by the Gemini `generateContent` RPC.
///
/// One request per frame: an inline image part plus the fixed
/// instruction, with a strict response schema so the reply is a bare
/// JSON array of detections.
pub struct GeminiFaceDetector {
    config: GeminiConfig,
    client: reqwest::blocking::Client,
}

impl GeminiFaceDetector {
    pub fn new(config: GeminiConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        format!("{API_BASE}/{}:generateContent", self.config.model)
    }
}

impl FaceDetector for GeminiFaceDetector {
    fn detect(&mut self, image: &EncodedFrame) -> Result<Vec<DetectedFace>, DetectionError> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request_body(image))
            .send()
            .map_err(|e| DetectionError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetectionError::Request(format!(
                "service returned HTTP {status}"
            )));
        }

        let envelope: GenerateContentResponse = response
            .json()
            .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;

        parse_detections(envelope.text())
    }
}

fn request_body(image: &EncodedFrame) -> serde_json::Value {
    json!({
        "contents": [{
            "parts": [
                {
                    "inlineData": {
                        "mimeType": image.mime_type,
                        "data": image.data.as_str(),
                    }
                },
                { "text": DETECTION_PROMPT },
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
        }
    })
}

/// Schema the service is instructed to answer with: a top-level array,
/// every field required.
fn response_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "gender": {
                    "type": "STRING",
                    "enum": ["male", "female", "unknown"],
                },
                "boundingBox": {
                    "type": "OBJECT",
                    "properties": {
                        "x": { "type": "NUMBER" },
                        "y": { "type": "NUMBER" },
                        "width": { "type": "NUMBER" },
                        "height": { "type": "NUMBER" },
                    },
                    "required": ["x", "y", "width", "height"],
                },
            },
            "required": ["gender", "boundingBox"],
        },
    })
}

/// Turns the model's text payload into detections.
///
/// Empty text is a valid "no answer" and maps to an empty list;
/// non-empty text that is not the agreed shape is an error.
fn parse_detections(text: &str) -> Result<Vec<DetectedFace>, DetectionError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|e| DetectionError::MalformedResponse(e.to_string()))
}

// Response envelope, reduced to the parts this client reads.

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// First text part of the first candidate, or `""` if the envelope
    /// carries no text at all.
    fn text(&self) -> &str {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .find_map(|part| part.text.as_deref())
            .unwrap_or("")
    }
}
