//! Prompt assembly: one instruction block from personality, devices,
//! memory, extra instructions and output language.
//!
//! Assembly is total. Every input has a default and nothing here can fail,
//! so the function sits safely on the hot path of every turn.

use crate::context::templates::{
    language_directive, personality_template, BASE_INSTRUCTIONS, EXTRA_HEADING, MEMORY_HEADING,
    NO_DEVICES,
};
use homeclaw_core::persona::{OutputLanguage, Personality};

/// Inputs for one assembly. Built once per turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptContext {
    pub personality: Personality,
    pub devices_context: String,
    pub memory_context: String,
    pub extra_instructions: String,
    pub output_language: OutputLanguage,
}

/// Build the complete custom system prompt.
///
/// Order: language directive, personality template (with base
/// instructions, devices and optional memory section), then the optional
/// extra-instructions section.
pub fn assemble(ctx: &PromptContext) -> String {
    let memory_section = if ctx.memory_context.trim().is_empty() {
        String::new()
    } else {
        format!("\n{MEMORY_HEADING}\n{}", ctx.memory_context.trim())
    };

    let devices = if ctx.devices_context.trim().is_empty() {
        NO_DEVICES
    } else {
        ctx.devices_context.as_str()
    };

    let body = fill_template(
        personality_template(ctx.personality),
        &[
            ("{base_instructions}", BASE_INSTRUCTIONS),
            ("{devices}", devices),
            ("{memory}", memory_section.as_str()),
        ],
    );

    let mut prompt = format!("{}\n\n{}", language_directive(ctx.output_language), body);

    let extra = ctx.extra_instructions.trim();
    if !extra.is_empty() {
        prompt.push_str(&format!("\n\n{EXTRA_HEADING}\n{extra}"));
    }

    prompt
}

/// Substitute placeholders in a single left-to-right pass.
///
/// Inserted values are never rescanned, so device names or memory text
/// containing placeholder literals come through verbatim.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(*key)) {
            Some(&(key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concise_italian_without_memory_or_devices() {
        let ctx = PromptContext {
            personality: Personality::Concise,
            output_language: OutputLanguage::It,
            ..Default::default()
        };
        let prompt = assemble(&ctx);

        assert!(prompt.starts_with("Rispondi SEMPRE in italiano solamente."));
        assert!(prompt.contains("One sentence, two at most"));
        assert!(prompt.contains("## Device Control Instructions"));
        assert!(prompt.contains(NO_DEVICES));
        assert!(!prompt.contains(MEMORY_HEADING));
        assert!(!prompt.contains(EXTRA_HEADING));
    }

    #[test]
    fn memory_section_only_when_non_empty() {
        let mut ctx = PromptContext {
            memory_context: "   ".into(),
            ..Default::default()
        };
        assert!(!assemble(&ctx).contains(MEMORY_HEADING));

        ctx.memory_context = "User preferences:\n- I prefer warm light".into();
        let prompt = assemble(&ctx);
        let heading = prompt.find(MEMORY_HEADING).unwrap();
        assert!(prompt[heading..].contains("I prefer warm light"));
    }

    #[test]
    fn devices_are_substituted() {
        let ctx = PromptContext {
            devices_context: "Area: kitchen\n- Kitchen Light (light.kitchen): off".into(),
            ..Default::default()
        };
        let prompt = assemble(&ctx);
        assert!(prompt.contains("## Available Devices\nArea: kitchen"));
        assert!(!prompt.contains(NO_DEVICES));
    }

    #[test]
    fn placeholder_literals_in_values_are_not_expanded() {
        let ctx = PromptContext {
            devices_context: "- Lamp {memory} (light.x): off".into(),
            memory_context: "SECRET-MEMORY {devices}".into(),
            ..Default::default()
        };
        let prompt = assemble(&ctx);

        assert!(prompt.contains("- Lamp {memory} (light.x): off"));
        assert!(prompt.contains("SECRET-MEMORY {devices}"));
        assert_eq!(prompt.matches("SECRET-MEMORY").count(), 1);
        assert_eq!(prompt.matches(MEMORY_HEADING).count(), 1);
    }

    #[test]
    fn fill_template_leaves_unknown_braces() {
        let out = fill_template("a {x} {y} {", &[("{x}", "1")]);
        assert_eq!(out, "a 1 {y} {");
    }

    #[test]
    fn extra_instructions_come_last() {
        let ctx = PromptContext {
            extra_instructions: "Call the user Captain.".into(),
            ..Default::default()
        };
        let prompt = assemble(&ctx);
        assert!(prompt.ends_with(&format!("{EXTRA_HEADING}\nCall the user Captain.")));
    }

    #[test]
    fn assembly_is_total_for_every_pair() {
        for p in Personality::ALL {
            for lang in OutputLanguage::ALL {
                let prompt = assemble(&PromptContext {
                    personality: p,
                    output_language: lang,
                    ..Default::default()
                });
                assert!(!prompt.is_empty());
                assert!(prompt.starts_with(language_directive(lang)));
                assert!(!prompt.contains("{devices}"));
            }
        }
    }

    #[test]
    fn unrecognized_inputs_use_defaults() {
        let ctx = PromptContext {
            personality: Personality::parse_lossy("pirate"),
            output_language: OutputLanguage::parse_lossy("xx"),
            ..Default::default()
        };
        let prompt = assemble(&ctx);
        assert!(prompt.starts_with("Always respond in English only."));
        assert!(prompt.contains("friendly and helpful"));
    }
}
