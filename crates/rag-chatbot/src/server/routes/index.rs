//! Server-rendered index page

use axum::{extract::State, response::Html};
use std::fmt::Write;

use crate::server::state::AppState;
use crate::types::IndexedFile;

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the page body
pub fn render_index(files: &[IndexedFile], has_index: bool) -> String {
    let mut rows = String::new();
    for file in files {
        let pages = file
            .pages
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            rows,
            "<tr><td title=\"{}\">{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&file.path),
            escape_html(&file.name),
            file.chunks,
            pages
        );
    }

    let status = if has_index {
        format!("インデックス済みファイル: {} 件", files.len())
    } else {
        "インデックスがありません。ファイルをアップロードして取り込みを実行してください。".to_string()
    };

    format!(
        r#"<!doctype html>
<html lang="ja">
<head>
<meta charset="utf-8">
<title>RAG Chatbot</title>
</head>
<body>
<h1>RAG Chatbot</h1>
<section id="files">
<p class="status">{status}</p>
<table>
<thead><tr><th>ファイル</th><th>チャンク</th><th>ページ</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
<form action="/api/upload" method="post" enctype="multipart/form-data">
<input type="file" name="files" multiple>
<button type="submit">アップロード</button>
</form>
<form action="/api/ingest" method="post"><button type="submit">取り込み</button></form>
</section>
<section id="ask">
<form action="/api/ask" method="post">
<input type="text" name="query" placeholder="質問を入力">
<select name="mode">
<option value="doc">doc</option>
<option value="web">web</option>
<option value="hybrid">hybrid</option>
</select>
<button type="submit">送信</button>
</form>
</section>
</body>
</html>
"#
    )
}

/// GET / - Indexed files and index status
pub async fn index_page(State(state): State<AppState>) -> Html<String> {
    let has_index = state.store().exists();
    let files = if has_index {
        match state.store().list_indexed_files().await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("failed to list indexed files: {}", e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    Html(render_index(&files, has_index))
}
