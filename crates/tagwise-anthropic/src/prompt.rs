// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt rendering for batch classification requests.
//!
//! The system prompt fixes the one-line-per-item response grammar the
//! pipeline's parser expects; the user turn enumerates the batch as
//! `"<index>. <text>"` lines with 1-based indices.

use std::fmt::Write;

use tagwise_core::{Batch, ClassificationMode};

const TAGS_ONLY_INSTRUCTIONS: &str = "あなたはコールセンターに寄せられたコメントを分類するアシスタントです。\
各コメントにメインタグを1つ、サブタグを最大2つ付けてください。\n\
回答はコメント1件につき1行、入力と同じ順序で、番号や説明を付けずに次の形式のみで出力してください:\n\
<メインタグ>|<サブタグ1>, <サブタグ2>";

const TAGS_SENTIMENT_INSTRUCTIONS: &str = "あなたはコールセンターに寄せられたコメントを分類するアシスタントです。\
各コメントにタグを3つと、感情ラベル（ポジティブ / ネガティブ / ニュートラル）を1つ付けてください。\n\
回答はコメント1件につき1行、入力と同じ順序で、番号や説明を付けずに次の形式のみで出力してください:\n\
<タグ1>, <タグ2>, <タグ3> | 感情: <ラベル>";

/// System instructions for the given mode.
pub fn system_prompt(mode: ClassificationMode) -> &'static str {
    match mode {
        ClassificationMode::TagsOnly => TAGS_ONLY_INSTRUCTIONS,
        ClassificationMode::TagsSentiment => TAGS_SENTIMENT_INSTRUCTIONS,
    }
}

/// User turn listing every batch item on its own numbered line.
pub fn render_items(batch: &Batch) -> String {
    let mut out = format!("以下の{}件のコメントを分類してください。\n\n", batch.len());
    for (i, text) in batch.texts().enumerate() {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}. {}", i + 1, text);
    }
    out
}
