//! Pure builder functions assembling prompt text from fixed templates plus
//! caller-supplied values (§4.5, §9 "assembled by pure builder functions").

pub const AGENT_BASE_SYSTEM_PROMPT: &str = include_str!("agent_base.txt");
const DUAL_TOOL_EXTENSION_TEMPLATE: &str = include_str!("dual_tool_extension.txt");
const DOCS_TOOL_EXTENSION: &str = include_str!("docs_tool_extension.txt");

pub const SQL_GENERATION_TEMPLATE: &str = include_str!("sql_generation.txt");

/// Data-coverage and budget status injected into the dual-tool extension.
#[derive(Clone, Debug)]
pub struct DualToolStatus {
    pub sql_max_year: u32,
    pub graphql_max_year: u32,
    pub graphql_budget_remaining: u32,
    pub graphql_budget_max: u32,
}

/// Builds the agent's system prompt: base template, optional dual-tool
/// extension (with budget/year status), optional docs-tool extension.
pub fn build_agent_system_prompt(dual_tool: Option<&DualToolStatus>, docs_enabled: bool) -> String {
    let mut sections = vec![AGENT_BASE_SYSTEM_PROMPT.to_string()];
    if let Some(status) = dual_tool {
        sections.push(
            DUAL_TOOL_EXTENSION_TEMPLATE
                .replace("{sql_max_year}", &status.sql_max_year.to_string())
                .replace("{graphql_max_year}", &status.graphql_max_year.to_string())
                .replace(
                    "{graphql_budget_remaining}",
                    &status.graphql_budget_remaining.to_string(),
                )
                .replace("{graphql_budget_max}", &status.graphql_budget_max.to_string()),
        );
    }
    if docs_enabled {
        sections.push(DOCS_TOOL_EXTENSION.to_string());
    }
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_prompt_alone_has_no_extensions() {
        let prompt = build_agent_system_prompt(None, false);
        assert_eq!(prompt, AGENT_BASE_SYSTEM_PROMPT);
    }

    #[test]
    fn dual_tool_extension_interpolates_status_fields() {
        let status = DualToolStatus {
            sql_max_year: 2023,
            graphql_max_year: 2022,
            graphql_budget_remaining: 2,
            graphql_budget_max: 3,
        };
        let prompt = build_agent_system_prompt(Some(&status), true);
        assert!(prompt.contains("2023"));
        assert!(prompt.contains("2022"));
        assert!(prompt.contains("2 of 3"));
    }
}
