//! System prompt 与搜索提示
//!
//! system prompt 注入当天日期与年份，模型才能区分“新”与“旧”信息；
//! 用户输入命中关键词时，第一轮额外追加一条要求使用搜索工具的指令。

use chrono::{DateTime, Datelike, Local, TimeZone};

/// 默认 system prompt 模板；{today} / {year} 在运行时替换
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful assistant with access to real-time web search via the search_web tool. Today is {today}.

Follow these rules:

1. Use the search_web tool for any question about current events, news, prices, market data, \
weather, sports results, recent releases, or anything else that changes over time.
2. Use the tool when the user asks you to search, look up, find or check something, or uses words \
like 'latest', 'current', 'recent', 'today' or 'now'.
3. Use the tool even if you think you know the answer; your training data may be outdated.
4. When searching, include the current year ({year}) in your queries when relevant.
5. When a search fails, say so briefly and answer as best you can.";

/// 命中关键词时追加的指令
pub const SEARCH_DIRECTIVE: &str = "This query requires real-time information. \
You MUST use the search_web tool to answer this question.";

pub fn default_force_search_keywords() -> Vec<String> {
    [
        "linkup",
        "search",
        "look up",
        "find out",
        "check",
        "latest",
        "current",
        "recent",
        "today",
        "now",
        "stock price",
        "news",
        "weather",
        "what is happening",
        "whats new",
        "breaking",
        "update",
        "real-time",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// 替换模板中的 {today} 与 {year}
pub fn render_system_prompt<Tz: TimeZone>(template: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    template
        .replace("{today}", &now.format("%B %d, %Y").to_string())
        .replace("{year}", &now.year().to_string())
}

/// 按本地时间渲染
pub fn system_prompt_for_today(template: &str) -> String {
    render_system_prompt(template, &Local::now())
}

/// 关键词搜索提示
#[derive(Debug, Clone)]
pub struct SearchNudge {
    enabled: bool,
    keywords: Vec<String>,
}

impl SearchNudge {
    pub fn new(enabled: bool, keywords: Vec<String>) -> Self {
        Self {
            enabled,
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, Vec::new())
    }

    /// 命中任一关键词（忽略大小写的子串匹配）时返回指令
    pub fn directive_for(&self, input: &str) -> Option<&'static str> {
        if !self.enabled {
            return None;
        }
        let lower = input.to_lowercase();
        self.keywords
            .iter()
            .any(|k| lower.contains(k.as_str()))
            .then_some(SEARCH_DIRECTIVE)
    }
}

impl Default for SearchNudge {
    fn default() -> Self {
        Self::new(true, default_force_search_keywords())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_render_system_prompt() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        let prompt = render_system_prompt(DEFAULT_SYSTEM_PROMPT, &now);
        assert!(prompt.contains("Today is March 05, 2026."));
        assert!(prompt.contains("current year (2026)"));
        assert!(!prompt.contains("{today}"));
    }

    #[test]
    fn test_nudge_matches_keywords() {
        let nudge = SearchNudge::default();
        assert_eq!(
            nudge.directive_for("What is the CURRENT Bitcoin price?"),
            Some(SEARCH_DIRECTIVE)
        );
        assert_eq!(nudge.directive_for("Explain how photosynthesis works"), None);
    }

    #[test]
    fn test_disabled_nudge() {
        assert_eq!(SearchNudge::disabled().directive_for("latest news"), None);
    }
}
