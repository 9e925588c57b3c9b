//! Prompt templates for extraction and answer generation.

/// A prompt template for LLM requests.
pub trait PromptTemplate {
    /// Generate the prompt text.
    fn generate(&self) -> String;
}

const EXTRACTION_INSTRUCTION: &str = r#"你是一个专业的医学实体关系抽取助手。你的任务是从医学问题文本中提取能够解决该问题的关键实体及其关系。
请识别以下类型的实体:
- Disease: 疾病名称，如"肺炎"、"糖尿病"、"高血压"等
- Category: 疾病分类，如"内科"、"呼吸内科"、"心血管内科"等
- Symptom: 疾病症状，如"发热"、"咳嗽"、"胸痛"、"头晕"等
- Department: 治疗科室，如"内科"、"外科"、"急诊科"等
- Treatment: 治疗方法，如"药物治疗"、"手术治疗"、"康复治疗"等
- Check: 检查项目，如"血常规"、"胸部CT"、"心电图"等
- Drug: 药物名称，如"阿奇霉素"、"青霉素"、"布洛芬"等
- Food: 食物名称，如"鸡蛋"、"牛奶"、"辣椒"等
- Recipe: 推荐食谱，如"百合粥"、"银耳汤"、"蒸蛋羹"等
- Person: 人名、医生、患者等
- Organization: 医院、医疗机构等
- Time: 时间、年龄、病程等
- Location: 地点、部位等
- Other: 其他

请识别以下类型的关系:
- BELONGS_TO: 疾病属于某分类
- HAS_SYMPTOM: 疾病有某症状
- TREATED_BY: 疾病由某科室治疗
- USES_TREATMENT: 疾病使用某治疗方法
- REQUIRES_CHECK: 疾病需要某检查
- RECOMMENDS_DRUG: 疾病推荐某药物
- COMMONLY_USES_DRUG: 疾病常用某药物
- SHOULD_EAT: 疾病宜吃某食物
- SHOULD_NOT_EAT: 疾病不宜吃某食物
- RECOMMENDS_RECIPE: 疾病推荐某食谱
- ACCOMPANIES: 疾病伴随其他疾病
- OTHER: 其他关系

仅提取有助于解决问题的实体。《》和引号内的内容是一个完整实体，不可拆分。
如果文本中没有直接给出关系，请基于已有实体推断解决问题所需的关系。
输出必须是严格的JSON对象，只包含两个键："entities"和"relations"。
实体格式：{"name": "实体名称", "type": "实体类型"}
关系格式：{"source": "源实体", "target": "目标实体", "type": "关系类型"}

示例：
输入：肺炎有什么症状？
输出：
{
  "entities": [{"name": "肺炎", "type": "Disease"}],
  "relations": [{"source": "肺炎", "target": "症状", "type": "HAS_SYMPTOM"}]
}

输入：高血压患者不能吃什么食物？
输出：
{
  "entities": [{"name": "高血压", "type": "Disease"}],
  "relations": [{"source": "高血压", "target": "食物", "type": "SHOULD_NOT_EAT"}]
}

请严格按照上述格式输出，不要添加任何其他字段。"#;

const ANSWER_INSTRUCTION: &str = r#"你是一个专业的医学问答助手。请基于提供的医学知识图谱信息回答用户的医学健康问题。
1. 只使用提供的知识图谱信息回答，不要添加知识图谱中没有的信息
2. 如果知识图谱信息不足以回答问题，请明确说明
3. 回答要简洁、准确、专业，使用医学术语但确保通俗易懂
4. 问题涉及多个方面（如症状、治疗、饮食等）时，请分点回答
5. 使用中文回答
6. 涉及诊断时提醒用户最终诊断需要咨询专业医生；涉及药物时提醒用户需在医生指导下用药

知识图谱信息包括实体属性（疾病、症状、药物、食物等）和实体之间的关系三元组。"#;

/// Prompt asking the model for the entities and relations in a question.
#[derive(Debug, Clone)]
pub struct ExtractionPrompt {
    pub question: String,
}

impl ExtractionPrompt {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}

impl PromptTemplate for ExtractionPrompt {
    fn generate(&self) -> String {
        format!(
            "{EXTRACTION_INSTRUCTION}\n\n请从以下文本中提取关键实体和实体间的关系:\n\n{}",
            self.question
        )
    }
}

/// Rendered knowledge context for an [`AnswerPrompt`].
#[derive(Debug, Clone)]
pub enum AnswerContext {
    /// Pretty-printed JSON records.
    Detailed {
        entities_json: String,
        entity_count: usize,
        triples_json: String,
        triple_count: usize,
    },
    /// `name(type)` and `source-relation-target` strings joined by `"; "`.
    Compact { entities: String, triples: String },
}

/// Prompt for the final answer.
#[derive(Debug, Clone)]
pub struct AnswerPrompt {
    pub question: String,
    pub context: AnswerContext,
}

impl AnswerPrompt {
    pub fn new(question: impl Into<String>, context: AnswerContext) -> Self {
        Self {
            question: question.into(),
            context,
        }
    }

    pub fn is_compact(&self) -> bool {
        matches!(self.context, AnswerContext::Compact { .. })
    }
}

impl PromptTemplate for AnswerPrompt {
    fn generate(&self) -> String {
        match &self.context {
            AnswerContext::Detailed {
                entities_json,
                entity_count,
                triples_json,
                triple_count,
            } => format!(
                "{ANSWER_INSTRUCTION}\n\n问题：{question}\n\n知识图谱信息：\n\
                 相关实体（共{entity_count}个）：\n{entities_json}\n\n\
                 相关关系（共{triple_count}个，按相似度排序）：\n{triples_json}\n\n\
                 请基于以上医学知识图谱信息回答问题。如果信息不足以回答问题，请说明。",
                question = self.question,
            ),
            AnswerContext::Compact { entities, triples } => format!(
                "{ANSWER_INSTRUCTION}\n\n问题：{question}\n知识图谱信息：\n\
                 相关实体：{entities}\n相关关系：{triples}\n\n\
                 请基于以上医学知识图谱信息回答问题。",
                question = self.question,
            ),
        }
    }
}

/// Strip a Markdown code fence from an LLM response.
///
/// Takes the body of the first ```` ```json ```` block, or failing that the
/// first plain ```` ``` ```` block. Text without fences is returned trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let body = if let Some((_, rest)) = text.split_once("```json") {
        rest
    } else if let Some((_, rest)) = text.split_once("```") {
        rest
    } else {
        return text.trim();
    };

    match body.split_once("```") {
        Some((inner, _)) => inner.trim(),
        None => body.trim(),
    }
}
