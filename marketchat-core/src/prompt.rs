//! System prompt compilation
//!
//! Callers describe a system prompt as an ordered list of sections tagged
//! with how often they change. [`compile`] renders that intent into whatever
//! the target model understands: TTL-tagged cache blocks, a prefix-stable
//! plain string, or a flat concatenation.

use crate::registry;

/// How often a prompt section's content changes between requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volatility {
    /// Never changes (tool instructions, persona)
    Static,
    /// Changes occasionally (market session context)
    SemiStatic,
    /// Changes every request (per-user portfolio data)
    Dynamic,
}

impl Volatility {
    fn ttl(self) -> CacheTtl {
        match self {
            Volatility::Static => CacheTtl::OneHour,
            Volatility::SemiStatic => CacheTtl::FiveMinutes,
            Volatility::Dynamic => CacheTtl::NoCache,
        }
    }
}

/// One ordered piece of a system prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSection {
    /// The section text
    pub text: String,
    /// How often this section changes
    pub volatility: Volatility,
}

/// A provider-agnostic system prompt, built by callers and never mutated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemPromptIntent {
    /// Ordered sections
    pub sections: Vec<PromptSection>,
}

impl SystemPromptIntent {
    /// Create an empty intent
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section
    pub fn section(mut self, text: impl Into<String>, volatility: Volatility) -> Self {
        self.sections.push(PromptSection {
            text: text.into(),
            volatility,
        });
        self
    }
}

/// Cache lifetime of one compiled block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTtl {
    /// Vendor-side cache for one hour
    OneHour,
    /// Vendor-side cache for five minutes
    FiveMinutes,
    /// Not cached
    NoCache,
}

impl CacheTtl {
    /// Ordering rank: longer TTLs must precede shorter ones in a compiled
    /// prompt or vendors reject (or silently disable) caching.
    fn rank(self) -> u8 {
        match self {
            CacheTtl::OneHour => 0,
            CacheTtl::FiveMinutes => 1,
            CacheTtl::NoCache => 2,
        }
    }
}

/// One TTL-tagged fragment of a compiled system prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheBlock {
    /// Block text
    pub text: String,
    /// Cache lifetime
    pub ttl: CacheTtl,
}

/// A system prompt rendered for a specific model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledSystemPrompt {
    /// A single plain string
    Text(String),
    /// An ordered list of cache blocks, longest TTL first
    Blocks(Vec<CacheBlock>),
}

/// Hard vendor cap on the number of cache-marked blocks per request
pub const MAX_CACHE_BLOCKS: usize = 4;

/// Separator used whenever sections or blocks are joined into one string
const SECTION_SEPARATOR: &str = "\n\n";

/// Compile an intent for the given model.
///
/// Returns `None` for an empty intent (or one whose sections are all blank):
/// the system field must then be omitted entirely, since vendors reject an
/// empty string or an empty block array.
pub fn compile(intent: &SystemPromptIntent, model_id: &str) -> Option<CompiledSystemPrompt> {
    let sections: Vec<&PromptSection> = intent
        .sections
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .collect();
    if sections.is_empty() {
        return None;
    }

    if registry::supports_caching(model_id) {
        Some(CompiledSystemPrompt::Blocks(compile_blocks(&sections)))
    } else if registry::supports_prefix_caching(model_id) {
        // Stable content first, per-request content last, so consecutive
        // requests share the longest possible byte-identical prefix.
        let mut ordered = sections;
        ordered.sort_by_key(|s| s.volatility.ttl().rank());
        Some(CompiledSystemPrompt::Text(join(&ordered)))
    } else {
        Some(CompiledSystemPrompt::Text(join(&sections)))
    }
}

fn join(sections: &[&PromptSection]) -> String {
    sections
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

fn compile_blocks(sections: &[&PromptSection]) -> Vec<CacheBlock> {
    // Merge adjacent same-TTL sections first to stay under the vendor cap.
    let mut blocks: Vec<CacheBlock> = Vec::new();
    for section in sections {
        let ttl = section.volatility.ttl();
        match blocks.last_mut() {
            Some(last) if last.ttl == ttl => {
                last.text.push_str(SECTION_SEPARATOR);
                last.text.push_str(&section.text);
            }
            _ => blocks.push(CacheBlock {
                text: section.text.clone(),
                ttl,
            }),
        }
    }

    // Longer-TTL blocks must precede shorter ones. The sort is stable, so
    // caller order is preserved within each TTL class.
    blocks.sort_by_key(|b| b.ttl.rank());

    if blocks.len() > MAX_CACHE_BLOCKS {
        blocks = merge_ttl_runs(blocks);
    }

    debug_assert!(is_ttl_ordered(&blocks));
    blocks
}

/// Collapse adjacent equal-TTL blocks. After the TTL sort this leaves at most
/// one block per TTL class.
fn merge_ttl_runs(blocks: Vec<CacheBlock>) -> Vec<CacheBlock> {
    let mut merged: Vec<CacheBlock> = Vec::new();
    for block in blocks {
        match merged.last_mut() {
            Some(last) if last.ttl == block.ttl => {
                last.text.push_str(SECTION_SEPARATOR);
                last.text.push_str(&block.text);
            }
            _ => merged.push(block),
        }
    }
    merged
}

/// Whether every longer-TTL block precedes every shorter-TTL block
pub fn is_ttl_ordered(blocks: &[CacheBlock]) -> bool {
    blocks
        .windows(2)
        .all(|w| w[0].ttl.rank() <= w[1].ttl.rank())
}

/// Lossy downgrade of a compiled prompt to a plain string, for drivers that
/// cannot accept cache blocks. Block texts are joined with a blank line
/// (`"A\n\nB"` for blocks A and B); already-flat prompts pass through
/// unchanged, so the function is idempotent.
pub fn blocks_to_string(prompt: &CompiledSystemPrompt) -> String {
    match prompt {
        CompiledSystemPrompt::Text(text) => text.clone(),
        CompiledSystemPrompt::Blocks(blocks) => blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(SECTION_SEPARATOR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Registry fixtures: claude-sonnet-4-5 supports cache blocks, gpt-4o
    // supports prefix caching only.
    const BLOCK_MODEL: &str = "claude-sonnet-4-5";
    const PREFIX_MODEL: &str = "gpt-4o";
    const PLAIN_MODEL: &str = "not-in-registry";

    fn intent(sections: &[(&str, Volatility)]) -> SystemPromptIntent {
        sections
            .iter()
            .fold(SystemPromptIntent::new(), |acc, (text, vol)| {
                acc.section(*text, *vol)
            })
    }

    #[test]
    fn test_empty_intent_compiles_to_absent() {
        assert_eq!(compile(&SystemPromptIntent::new(), BLOCK_MODEL), None);
        assert_eq!(compile(&SystemPromptIntent::new(), PREFIX_MODEL), None);
        assert_eq!(compile(&SystemPromptIntent::new(), PLAIN_MODEL), None);

        let blank = intent(&[("   ", Volatility::Static), ("", Volatility::Dynamic)]);
        assert_eq!(compile(&blank, BLOCK_MODEL), None);
    }

    #[test]
    fn test_plain_model_flattens_in_caller_order() {
        let i = intent(&[
            ("dynamic", Volatility::Dynamic),
            ("static", Volatility::Static),
        ]);
        assert_eq!(
            compile(&i, PLAIN_MODEL),
            Some(CompiledSystemPrompt::Text("dynamic\n\nstatic".into()))
        );
    }

    #[test]
    fn test_prefix_model_orders_stable_content_first() {
        let i = intent(&[
            ("per-user", Volatility::Dynamic),
            ("session", Volatility::SemiStatic),
            ("persona", Volatility::Static),
            ("tools", Volatility::Static),
        ]);
        assert_eq!(
            compile(&i, PREFIX_MODEL),
            Some(CompiledSystemPrompt::Text(
                "persona\n\ntools\n\nsession\n\nper-user".into()
            ))
        );
    }

    #[test]
    fn test_block_model_merges_adjacent_and_sorts_by_ttl() {
        let i = intent(&[
            ("a", Volatility::Static),
            ("b", Volatility::Static),
            ("c", Volatility::SemiStatic),
            ("d", Volatility::Dynamic),
        ]);
        let compiled = compile(&i, BLOCK_MODEL).unwrap();
        assert_eq!(
            compiled,
            CompiledSystemPrompt::Blocks(vec![
                CacheBlock {
                    text: "a\n\nb".into(),
                    ttl: CacheTtl::OneHour
                },
                CacheBlock {
                    text: "c".into(),
                    ttl: CacheTtl::FiveMinutes
                },
                CacheBlock {
                    text: "d".into(),
                    ttl: CacheTtl::NoCache
                },
            ])
        );
    }

    #[test]
    fn test_ttl_ordering_holds_under_permuted_input() {
        use Volatility::*;
        let volatilities = [Static, SemiStatic, Dynamic, SemiStatic, Static, Dynamic];
        // Rotate through every cyclic permutation of a mixed section list.
        for offset in 0..volatilities.len() {
            let sections: Vec<(String, Volatility)> = (0..volatilities.len())
                .map(|i| {
                    let v = volatilities[(i + offset) % volatilities.len()];
                    (format!("s{}", i), v)
                })
                .collect();
            let mut i = SystemPromptIntent::new();
            for (text, vol) in &sections {
                i = i.section(text.clone(), *vol);
            }
            match compile(&i, BLOCK_MODEL).unwrap() {
                CompiledSystemPrompt::Blocks(blocks) => {
                    assert!(is_ttl_ordered(&blocks), "offset {}: {:?}", offset, blocks);
                    assert!(blocks.len() <= MAX_CACHE_BLOCKS);
                }
                other => panic!("expected blocks, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_block_cap_enforced_by_merging() {
        use Volatility::*;
        // Alternating volatilities produce more than four runs before the
        // sort; the compiler must collapse them back under the cap.
        let i = intent(&[
            ("a", Static),
            ("b", Dynamic),
            ("c", Static),
            ("d", Dynamic),
            ("e", SemiStatic),
            ("f", Static),
            ("g", SemiStatic),
        ]);
        match compile(&i, BLOCK_MODEL).unwrap() {
            CompiledSystemPrompt::Blocks(blocks) => {
                assert!(blocks.len() <= MAX_CACHE_BLOCKS, "{:?}", blocks);
                assert!(is_ttl_ordered(&blocks));
                // Caller order preserved within each TTL class.
                assert_eq!(blocks[0].text, "a\n\nc\n\nf");
                assert_eq!(blocks[1].text, "e\n\ng");
                assert_eq!(blocks[2].text, "b\n\nd");
            }
            other => panic!("expected blocks, got {:?}", other),
        }
    }

    #[test]
    fn test_blocks_to_string_concatenation() {
        let prompt = CompiledSystemPrompt::Blocks(vec![
            CacheBlock {
                text: "A".into(),
                ttl: CacheTtl::OneHour,
            },
            CacheBlock {
                text: "B".into(),
                ttl: CacheTtl::FiveMinutes,
            },
        ]);
        let flat = blocks_to_string(&prompt);
        assert_eq!(flat, "A\n\nB");

        // Idempotent on already-flattened input.
        let again = blocks_to_string(&CompiledSystemPrompt::Text(flat.clone()));
        assert_eq!(again, flat);
    }
}
