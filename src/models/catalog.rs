//! Static catalog of the generation models the assistant can call, with
//! their free-tier request limits for advisory rate-limit display.

/// One entry in the model catalog. `rpm`/`rpd` are the free-tier
/// requests-per-minute / requests-per-day limits; `tpm` is a display string.
#[derive(Debug, Clone, Copy)]
pub struct ModelConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rpm: u32,
    pub rpd: u32,
    pub tpm: &'static str,
    pub stable: bool,
    pub pro: bool,
}

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub const MODELS: &[ModelConfig] = &[
    ModelConfig {
        id: "gemini-2.0-flash",
        name: "Gemini 2.0 Flash",
        description: "Fast general-purpose model, best default",
        rpm: 15,
        rpd: 1500,
        tpm: "1M",
        stable: true,
        pro: false,
    },
    ModelConfig {
        id: "gemini-2.0-flash-lite-preview-02-05",
        name: "Gemini 2.0 Flash Lite",
        description: "Lightweight preview with higher request limits",
        rpm: 30,
        rpd: 1500,
        tpm: "1M",
        stable: false,
        pro: false,
    },
    ModelConfig {
        id: "gemini-1.5-flash",
        name: "Gemini 1.5 Flash",
        description: "Previous-generation fast model",
        rpm: 15,
        rpd: 1500,
        tpm: "1M",
        stable: true,
        pro: false,
    },
    ModelConfig {
        id: "gemini-1.5-flash-8b",
        name: "Gemini 1.5 Flash 8B",
        description: "Smallest model, cheapest and fastest",
        rpm: 15,
        rpd: 1500,
        tpm: "1M",
        stable: true,
        pro: false,
    },
    ModelConfig {
        id: "gemini-1.5-pro",
        name: "Gemini 1.5 Pro",
        description: "High intelligence, low rate limit",
        rpm: 2,
        rpd: 50,
        tpm: "32K",
        stable: true,
        pro: true,
    },
    ModelConfig {
        id: "gemini-2.0-pro-exp-02-05",
        name: "Gemini 2.0 Pro Experimental",
        description: "Strongest reasoning, experimental availability",
        rpm: 2,
        rpd: 50,
        tpm: "1M",
        stable: false,
        pro: true,
    },
    ModelConfig {
        id: "gemini-2.0-flash-thinking-exp-01-21",
        name: "Gemini 2.0 Flash Thinking",
        description: "Experimental reasoning variant of 2.0 Flash",
        rpm: 10,
        rpd: 1500,
        tpm: "4M",
        stable: false,
        pro: false,
    },
];

pub fn find(id: &str) -> Option<&'static ModelConfig> {
    MODELS.iter().find(|m| m.id == id)
}

/// Ordered candidates for a request: the preferred model first, then the
/// remaining stable non-pro models, then everything else. Pro models sit at
/// the back of the chain.
pub fn fallback_chain(preferred: &str) -> Vec<&'static str> {
    let mut chain: Vec<&'static str> = Vec::with_capacity(MODELS.len());
    chain.push(find(preferred).map(|m| m.id).unwrap_or(DEFAULT_MODEL));

    for model in MODELS.iter().filter(|m| m.stable && !m.pro) {
        if !chain.contains(&model.id) {
            chain.push(model.id);
        }
    }
    for model in MODELS {
        if !chain.contains(&model.id) {
            chain.push(model.id);
        }
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_is_in_catalog() {
        assert!(find(DEFAULT_MODEL).is_some());
    }

    #[test]
    fn test_fallback_chain_starts_with_preferred() {
        let chain = fallback_chain("gemini-1.5-pro");
        assert_eq!(chain[0], "gemini-1.5-pro");
        assert_eq!(chain.len(), MODELS.len());
    }

    #[test]
    fn test_fallback_chain_unknown_model_uses_default() {
        let chain = fallback_chain("not-a-model");
        assert_eq!(chain[0], DEFAULT_MODEL);
    }

    #[test]
    fn test_fallback_chain_prefers_stable_over_pro() {
        let chain = fallback_chain(DEFAULT_MODEL);
        let pro_pos = chain
            .iter()
            .position(|id| *id == "gemini-1.5-pro")
            .unwrap();
        let stable_pos = chain
            .iter()
            .position(|id| *id == "gemini-1.5-flash")
            .unwrap();
        assert!(stable_pos < pro_pos);
    }
}
