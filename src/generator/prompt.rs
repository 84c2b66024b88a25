use crate::i18n::TargetLanguage;

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: String,
    /// 开头的说明性指令
    pub opening_instruction: String,
    /// 结尾的强调性指令
    pub closing_instruction: String,
}

/// 插入到提示词中的一段材料
#[derive(Debug, Clone)]
pub struct PromptSection {
    pub heading: String,
    pub body: String,
    /// 是否用 `---` 包围正文，便于模型区分材料边界
    pub fenced: bool,
}

impl PromptSection {
    pub fn plain(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
            fenced: false,
        }
    }

    pub fn fenced(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
            fenced: true,
        }
    }
}

/// 标准的Prompt构建器
pub struct GeneratorPromptBuilder {
    template: PromptTemplate,
}

impl GeneratorPromptBuilder {
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    /// 构建系统提示词和用户提示词，系统提示词末尾附加语言指令
    pub fn build_prompts(
        &self,
        language: TargetLanguage,
        sections: &[PromptSection],
    ) -> (String, String) {
        let system_prompt = format!(
            "{}\n\n{}",
            self.template.system_prompt,
            language.prompt_instruction()
        );

        let mut prompt = String::new();

        // 开头说明性指令
        prompt.push_str(&self.template.opening_instruction);
        prompt.push_str("\n\n");

        for section in sections {
            prompt.push_str(&format!("## {}\n", section.heading));
            if section.fenced {
                prompt.push_str("---\n");
                prompt.push_str(section.body.trim());
                prompt.push_str("\n---\n\n");
            } else {
                prompt.push_str(section.body.trim());
                prompt.push_str("\n\n");
            }
        }

        // 结尾强调性指令
        prompt.push_str(&self.template.closing_instruction);

        (system_prompt, prompt)
    }
}
