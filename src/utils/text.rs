/// 按字符数截断上下文，避免在多字节字符中间切断
pub fn truncate_context(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}\n...(truncated)", &content[..byte_index]),
        None => content.to_string(),
    }
}

/// 合并连续空白为单个空格
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 主题转换为导出文件名使用的片段
pub fn file_stem_from_topic(topic: &str) -> String {
    let stem: String = topic
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let stem = stem
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem
    }
}
