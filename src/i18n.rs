use serde::{Deserialize, Serialize};

/// 目标语言类型
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "id")]
    #[default]
    Indonesian,
    #[serde(rename = "en")]
    English,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::Indonesian => write!(f, "id"),
            TargetLanguage::English => write!(f, "en"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" | "indonesian" | "bahasa" | "bahasa indonesia" => Ok(TargetLanguage::Indonesian),
            "en" | "english" => Ok(TargetLanguage::English),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

/// 页面、简报与导出文档中使用的固定文案
#[derive(Debug, Clone, Copy)]
pub struct Labels {
    pub title: &'static str,
    pub executive_summary: &'static str,
    pub background: &'static str,
    pub findings: &'static str,
    pub recommendations: &'static str,
    pub references: &'static str,
    pub chart: &'static str,
    pub document_notice: &'static str,
    pub download: &'static str,
    pub empty_topic: &'static str,
    pub no_relevant_information: &'static str,
    pub context_collected: &'static str,
    pub document_read: &'static str,
    pub draft_ready: &'static str,
    pub draft_failed: &'static str,
    pub chart_failed: &'static str,
    pub page_title: &'static str,
    pub page_subtitle: &'static str,
    pub search_tab: &'static str,
    pub upload_tab: &'static str,
    pub topic_label: &'static str,
    pub topic_placeholder: &'static str,
    pub engine_label: &'static str,
    pub file_label: &'static str,
    pub submit: &'static str,
    pub unsupported_document: &'static str,
    pub no_document_text: &'static str,
    pub searching: &'static str,
    pub search_failed: &'static str,
    pub reading_document: &'static str,
    pub document_read_failed: &'static str,
    pub drafting: &'static str,
    pub brief_error: &'static str,
    pub empty_response: &'static str,
    pub charting: &'static str,
    pub chart_error: &'static str,
}

const INDONESIAN: Labels = Labels {
    title: "Judul",
    executive_summary: "1. Ringkasan Eksekutif",
    background: "2. Pendahuluan",
    findings: "3. Temuan dan Pembahasan Mendalam",
    recommendations: "4. Rekomendasi Kebijakan Berbasis Bukti (Evidence-Based)",
    references: "5. Referensi",
    chart: "Visualisasi Data Kunci",
    document_notice: "Konteks brief ini berasal dari dokumen yang diunggah, bukan dari pencarian web.",
    download: "📥 Unduh Draf (.docx)",
    empty_topic: "Mohon masukkan topik atau kata kunci.",
    no_relevant_information: "Tidak ditemukan informasi yang cukup relevan dari pencarian.",
    context_collected: "Berhasil mengumpulkan konteks & sumber!",
    document_read: "Berhasil membaca teks dari dokumen!",
    draft_ready: "Draf berhasil dibuat!",
    draft_failed: "Draf policy brief gagal dibuat.",
    chart_failed: "Gagal membuat grafik",
    page_title: "📄 Policy Brief Generator (AI-Powered)",
    page_subtitle: "Masukkan topik, dan biarkan AI menyusun draf policy brief.",
    search_tab: "Pencarian Web",
    upload_tab: "Unggah Dokumen",
    topic_label: "Masukkan Topik atau Kata Kunci:",
    topic_placeholder: "Contoh: penurunan stunting di jawa tengah",
    engine_label: "Pilih Mesin Pencari:",
    file_label: "Unggah dokumen (PDF atau DOCX):",
    submit: "🚀 Buat Draf Lengkap",
    unsupported_document: "Format dokumen tidak didukung. Gunakan PDF atau DOCX.",
    no_document_text: "Tidak ada teks yang dapat dibaca dari dokumen yang diunggah.",
    searching: "🔎 Mencari dengan",
    search_failed: "Pencarian gagal",
    reading_document: "📄 Membaca",
    document_read_failed: "Gagal membaca dokumen",
    drafting: "🤖 Menganalisis konteks dan menyusun draf...",
    brief_error: "Terjadi kesalahan saat membuat brief",
    empty_response: "model mengembalikan respons kosong",
    charting: "📊 Merancang visualisasi data...",
    chart_error: "Terjadi kesalahan saat membuat grafik",
};

const ENGLISH: Labels = Labels {
    title: "Title",
    executive_summary: "1. Executive Summary",
    background: "2. Background",
    findings: "3. Findings and In-Depth Discussion",
    recommendations: "4. Evidence-Based Policy Recommendations",
    references: "5. References",
    chart: "Key Data Visualisation",
    document_notice: "The context for this brief comes from the uploaded document, not from a web search.",
    download: "📥 Download Draft (.docx)",
    empty_topic: "Please enter a topic or keyword.",
    no_relevant_information: "No sufficiently relevant information was found by the search.",
    context_collected: "Context and sources collected!",
    document_read: "Document text extracted!",
    draft_ready: "Draft created!",
    draft_failed: "The policy brief draft could not be generated.",
    chart_failed: "Failed to build the chart",
    page_title: "📄 Policy Brief Generator (AI-Powered)",
    page_subtitle: "Enter a topic and let the AI draft a policy brief.",
    search_tab: "Web Search",
    upload_tab: "Upload Document",
    topic_label: "Enter a topic or keyword:",
    topic_placeholder: "Example: reducing stunting in central java",
    engine_label: "Choose a search engine:",
    file_label: "Upload a document (PDF or DOCX):",
    submit: "🚀 Generate Full Draft",
    unsupported_document: "Unsupported document format. Please use PDF or DOCX.",
    no_document_text: "No readable text was found in the uploaded document.",
    searching: "🔎 Searching with",
    search_failed: "Search failed",
    reading_document: "📄 Reading",
    document_read_failed: "Failed to read the document",
    drafting: "🤖 Analysing the context and drafting the brief...",
    brief_error: "Error while generating the brief",
    empty_response: "the model returned an empty response",
    charting: "📊 Designing a data visualisation...",
    chart_error: "Error while generating the chart",
};

impl TargetLanguage {
    /// 获取语言的描述性名称
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::Indonesian => "Bahasa Indonesia",
            TargetLanguage::English => "English",
        }
    }

    /// 获取语言的提示词指令
    pub fn prompt_instruction(&self) -> &'static str {
        match self {
            TargetLanguage::Indonesian => {
                "Tulis seluruh isi policy brief dalam Bahasa Indonesia yang baku, lugas, dan mudah dipahami pengambil kebijakan."
            }
            TargetLanguage::English => {
                "Write the whole policy brief in English, using precise, professional language that policy makers can follow easily."
            }
        }
    }

    pub fn labels(&self) -> &'static Labels {
        match self {
            TargetLanguage::Indonesian => &INDONESIAN,
            TargetLanguage::English => &ENGLISH,
        }
    }

    /// 标题行可能使用的标记，导出时需要剥离
    pub fn all_title_labels() -> [&'static str; 2] {
        [INDONESIAN.title, ENGLISH.title]
    }
}
