//! API documentation routes.

use axum::{
    response::{Html, Redirect},
    Json,
};
use serde_json::{json, Value};

/// `GET /` sends callers to the documentation page.
pub async fn root_redirect() -> Redirect {
    Redirect::temporary("/docs")
}

/// `GET /docs`: Swagger UI bound to `/openapi.json`.
pub async fn docs_page() -> Html<&'static str> {
    Html(DOCS_HTML)
}

/// `GET /openapi.json`.
pub async fn openapi_json() -> Json<Value> {
    Json(openapi())
}

const DOCS_HTML: &str = r##"<!DOCTYPE html>
<html>
<head>
  <title>whisper-gateway - API docs</title>
  <meta charset="utf-8"/>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    SwaggerUIBundle({ url: "/openapi.json", dom_id: "#swagger-ui" });
  </script>
</body>
</html>
"##;

fn query_param(name: &str, description: &str, schema: Value) -> Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": schema,
    })
}

/// OpenAPI 3 description of the gateway's own routes.
pub fn openapi() -> Value {
    let detail = json!({
        "type": "object",
        "properties": { "detail": {} }
    });

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "whisper-gateway",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Authenticated proxy in front of a Whisper ASR service."
        },
        "components": {
            "securitySchemes": {
                "ApiKey": { "type": "apiKey", "in": "header", "name": "x-api-key" },
                "Bearer": { "type": "http", "scheme": "bearer" }
            }
        },
        "paths": {
            "/health": {
                "get": {
                    "summary": "Gateway and backend liveness",
                    "responses": {
                        "200": { "description": "Backend reachable" },
                        "503": { "description": "Backend unreachable or unhealthy" }
                    }
                }
            },
            "/asr": {
                "post": {
                    "summary": "Forward an upload to the Whisper service unchanged",
                    "description": "The request body, headers and query string are streamed to the backend's /asr route and its response is streamed back. See the Whisper service documentation for the full contract.",
                    "security": [{ "ApiKey": [] }],
                    "parameters": [
                        query_param("encode", "Encode audio first through ffmpeg", json!({ "type": "boolean", "default": true })),
                        query_param("task", "Task to run", json!({ "type": "string", "enum": ["transcribe", "translate"], "default": "transcribe" })),
                        query_param("language", "Language of the audio", json!({ "type": "string" })),
                        query_param("word_timestamps", "Word level timestamps", json!({ "type": "boolean", "default": false })),
                        query_param("output", "Output format", json!({ "type": "string", "enum": ["txt", "vtt", "srt", "tsv", "json"], "default": "txt" }))
                    ],
                    "requestBody": {
                        "content": {
                            "multipart/form-data": {
                                "schema": {
                                    "type": "object",
                                    "properties": { "audio_file": { "type": "string", "format": "binary" } }
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": { "description": "Backend response, passed through" },
                        "403": { "description": "Missing or invalid x-api-key", "content": { "application/json": { "schema": detail } } }
                    }
                }
            },
            "/audio/transcriptions": {
                "post": {
                    "summary": "OpenAI-compatible transcription",
                    "security": [{ "Bearer": [] }],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "multipart/form-data": {
                                "schema": {
                                    "type": "object",
                                    "required": ["file"],
                                    "properties": {
                                        "file": { "type": "string", "format": "binary" },
                                        "model": { "type": "string", "description": "Accepted and ignored" },
                                        "language": { "type": "string" },
                                        "response_format": { "type": "string", "enum": ["json", "text"], "default": "json" }
                                    }
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "description": "Transcript",
                            "content": {
                                "application/json": {
                                    "schema": { "type": "object", "properties": { "text": { "type": "string" } } }
                                }
                            }
                        },
                        "401": { "description": "Missing or non-Bearer credentials" },
                        "403": { "description": "Invalid token" },
                        "422": { "description": "Missing file field" }
                    }
                }
            }
        }
    })
}
