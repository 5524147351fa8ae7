use std::sync::Arc;

use alt_text_generator::{format_html, Captioner};
use anyhow::Context;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct AppState {
    api_token: String,
    captioner: Captioner,
}

#[derive(Serialize)]
struct AltTextResponse {
    alt_text: String,
    html: String,
    processing_time_ms: u128,
}

async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AltTextResponse>, StatusCode> {
    let start = std::time::Instant::now();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let filename = field.file_name().unwrap_or("image.jpg").to_owned();
        let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;

        let img = image::load_from_memory(&data).map_err(|err| {
            tracing::warn!(%err, "rejected undecodable upload");
            StatusCode::BAD_REQUEST
        })?;

        let alt_text = state
            .captioner
            .generate_caption(&img, &state.api_token)
            .await
            .map_err(|err| {
                // Every pipeline failure collapses to one "try again" answer;
                // the classification only reaches the logs.
                tracing::error!(%err, "caption generation failed");
                StatusCode::BAD_GATEWAY
            })?;

        let elapsed = start.elapsed().as_millis();
        tracing::info!(%filename, elapsed_ms = elapsed, "generated alt text");

        return Ok(Json(AltTextResponse {
            html: format_html(&alt_text, &filename),
            alt_text,
            processing_time_ms: elapsed,
        }));
    }

    Err(StatusCode::BAD_REQUEST)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let api_token = std::env::var("HF_API_TOKEN")
        .context("HF_API_TOKEN must be set in the environment or a .env file")?;
    let captioner = match std::env::var("HF_API_URL") {
        Ok(url) => Captioner::with_endpoint(url),
        Err(_) => Captioner::new(),
    };

    let state = Arc::new(AppState {
        api_token,
        captioner,
    });

    let app = Router::new()
        .route("/", get(index))
        .route("/upload", post(upload_image))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on http://localhost:3000");

    axum::serve(listener, app).await?;
    Ok(())
}

const INDEX_PAGE: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Image Alt Text Generator</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f4f6fb;
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            padding: 20px;
        }

        .container {
            background: white;
            border-radius: 14px;
            box-shadow: 0 10px 40px rgba(0,0,0,0.12);
            max-width: 760px;
            width: 100%;
            padding: 36px;
        }

        h1 { color: #222; margin-bottom: 8px; }

        .subtitle { color: #667; margin-bottom: 28px; font-size: 0.95em; }

        .drop-zone {
            border: 2px dashed #4a6cf7;
            border-radius: 12px;
            padding: 48px 20px;
            text-align: center;
            cursor: pointer;
            background: #f8faff;
            transition: background 0.2s;
        }

        .drop-zone:hover, .drop-zone.dragover { background: #eef2ff; }

        .drop-zone p { color: #4a6cf7; font-weight: 600; }

        .drop-hint { color: #99a; font-size: 0.85em; margin-top: 8px; }

        input[type="file"] { display: none; }

        .spinner-box { text-align: center; padding: 36px; display: none; }

        .spinner {
            border: 4px solid #e8e8e8;
            border-top-color: #4a6cf7;
            border-radius: 50%;
            width: 44px;
            height: 44px;
            animation: spin 0.9s linear infinite;
            margin: 0 auto 16px;
        }

        @keyframes spin { to { transform: rotate(360deg); } }

        .results { display: none; margin-top: 24px; }

        .preview {
            max-width: 100%;
            border-radius: 10px;
            margin-bottom: 18px;
        }

        .result-block {
            background: #f8faff;
            border-radius: 10px;
            padding: 16px;
            margin-bottom: 14px;
        }

        .result-label {
            color: #4a6cf7;
            font-size: 0.8em;
            font-weight: 600;
            text-transform: uppercase;
            letter-spacing: 1px;
            margin-bottom: 8px;
        }

        .alt-text { color: #222; font-size: 1.05em; line-height: 1.5; }

        code {
            display: block;
            background: #222;
            color: #9fe8a0;
            padding: 12px;
            border-radius: 8px;
            font-size: 0.9em;
            overflow-x: auto;
            white-space: pre;
        }

        button {
            background: #4a6cf7;
            color: white;
            border: none;
            border-radius: 8px;
            padding: 8px 16px;
            margin-top: 10px;
            cursor: pointer;
            font-weight: 600;
        }

        button:hover { background: #3a5ae0; }

        .timing { color: #99a; font-size: 0.8em; margin-top: 6px; }

        .error {
            display: none;
            background: #fdecec;
            border: 1px solid #f5b5b5;
            color: #b13232;
            padding: 14px;
            border-radius: 10px;
            margin-top: 18px;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>🖼️ Image Alt Text Generator</h1>
        <p class="subtitle">Upload an image and get AI-generated alt text for better web accessibility.</p>

        <div class="drop-zone" id="dropZone">
            <p>Click or drag an image here</p>
            <div class="drop-hint">PNG, JPG, or WebP</div>
            <input type="file" id="fileInput" accept="image/*">
        </div>

        <div class="spinner-box" id="spinnerBox">
            <div class="spinner"></div>
            <p>Generating alt text...</p>
        </div>

        <div class="error" id="errorBox">Could not generate alt text. Please try again.</div>

        <div class="results" id="results">
            <img id="preview" class="preview" alt="Uploaded image preview">
            <div class="result-block">
                <div class="result-label">Generated Alt Text</div>
                <div class="alt-text" id="altText"></div>
                <button id="copyAlt">Copy Alt Text</button>
            </div>
            <div class="result-block">
                <div class="result-label">HTML Code</div>
                <code id="htmlCode"></code>
                <button id="copyHtml">Copy HTML</button>
                <div class="timing">Processed in <span id="timing">--</span> ms</div>
            </div>
        </div>
    </div>

    <script>
        const dropZone = document.getElementById('dropZone');
        const fileInput = document.getElementById('fileInput');
        const spinnerBox = document.getElementById('spinnerBox');
        const errorBox = document.getElementById('errorBox');
        const results = document.getElementById('results');
        const preview = document.getElementById('preview');
        const altText = document.getElementById('altText');
        const htmlCode = document.getElementById('htmlCode');
        const timing = document.getElementById('timing');

        dropZone.addEventListener('click', () => fileInput.click());
        dropZone.addEventListener('dragover', (e) => {
            e.preventDefault();
            dropZone.classList.add('dragover');
        });
        dropZone.addEventListener('dragleave', () => dropZone.classList.remove('dragover'));
        dropZone.addEventListener('drop', (e) => {
            e.preventDefault();
            dropZone.classList.remove('dragover');
            const file = e.dataTransfer.files[0];
            if (file && file.type.startsWith('image/')) submit(file);
        });
        fileInput.addEventListener('change', (e) => {
            if (e.target.files[0]) submit(e.target.files[0]);
        });

        document.getElementById('copyAlt').addEventListener('click', () => {
            navigator.clipboard.writeText(altText.textContent);
        });
        document.getElementById('copyHtml').addEventListener('click', () => {
            navigator.clipboard.writeText(htmlCode.textContent);
        });

        async function submit(file) {
            const reader = new FileReader();
            reader.onload = (e) => { preview.src = e.target.result; };
            reader.readAsDataURL(file);

            spinnerBox.style.display = 'block';
            results.style.display = 'none';
            errorBox.style.display = 'none';

            const formData = new FormData();
            formData.append('image', file, file.name);

            try {
                const response = await fetch('/upload', { method: 'POST', body: formData });
                if (!response.ok) throw new Error('upload failed');

                const result = await response.json();
                spinnerBox.style.display = 'none';
                results.style.display = 'block';
                altText.textContent = result.alt_text;
                htmlCode.textContent = result.html;
                timing.textContent = result.processing_time_ms;
            } catch (err) {
                spinnerBox.style.display = 'none';
                errorBox.style.display = 'block';
            }
        }
    </script>
</body>
</html>
"#;
