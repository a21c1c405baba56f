use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ShaderLabParams {
    // Max recursion of the matcher before a node is reported unmatched.
    pub depth_limit: u32,
    // Add keyword snippets when completing an unrecognized line.
    pub keyword_completion: bool,
}

impl Default for ShaderLabParams {
    fn default() -> Self {
        Self {
            depth_limit: 512,
            keyword_completion: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ShaderLabParams;

    #[test]
    fn params_from_json() {
        let params: ShaderLabParams = serde_json::from_str(r#"{ "depthLimit": 64 }"#).unwrap();
        assert_eq!(params.depth_limit, 64);
        assert!(params.keyword_completion, "Missing field should keep default");
        let params: ShaderLabParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, ShaderLabParams::default());
    }
}
