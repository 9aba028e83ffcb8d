//! Prompt composers, one per phase.

/// Jungian archetypes with dark fantasy twists
pub const ARCHETYPES: [&str; 10] = [
    "The Shadow (repressed darkness, hidden self)",
    "The Anima/Animus (inner opposite, soul guide)",
    "The Wise Old Man (aged mentor with secrets)",
    "The Trickster (chaos, transformation through disruption)",
    "The Hero (quest, but at what cost?)",
    "The Mother (nurturing that suffocates or heals)",
    "The Eternal Child (innocence preserved or corrupted)",
    "The Ruler (power's corruption or responsibility)",
    "The Outcast (exiled truth-teller)",
    "The Martyr (sacrifice that may be meaningless)",
];

/// Archetypes offered to the character phase
pub const OFFERED_ARCHETYPES: usize = 5;

const JSON_ONLY: &str = "Respond ONLY with the JSON, no other text.";

/// Everything a composer may interpolate.
#[derive(Debug, Clone, Copy)]
pub struct PromptInputs<'a> {
    pub project_name: &'a str,
    pub constraints: &'a str,
    /// Plain-text summary of earlier phases
    pub context: &'a str,
    pub count: u32,
    pub suggested_names: &'a [String],
}

pub(crate) fn eras_prompt(input: &PromptInputs<'_>) -> String {
    format!(
        r#"You are a master worldbuilder creating the historical foundation for a dark fantasy game called "{project}".

{constraints}

TONE: Dark fantasy, introspective, morally complex.
Focus on tragedy, betrayal and revenge, but also moments of love, hope and peace that make the darkness meaningful.

Generate {count} distinct historical eras, from creation to the present day. Also create the cosmology (creation myth, divine forces).

Return your response as valid JSON in this exact format:
{{
    "cosmology": {{
        "creation_myth": "A 2-3 sentence creation myth",
        "divine_forces": "Description of gods, spirits, or cosmic forces",
        "cosmic_balance": "What forces are in tension (not just generic good vs evil)",
        "forbidden_knowledge": "What truth about creation is hidden or dangerous"
    }},
    "eras": [
        {{
            "name": "Era name (avoid generic names like 'Age of Light')",
            "duration": "Approximate timespan",
            "summary": "2-3 sentence summary of this era",
            "defining_event": "The most significant event",
            "emotional_tone": "What emotions define this era",
            "legacy": "What this era left behind for future generations",
            "is_cataclysm": false
        }}
    ]
}}

Make at least one era a cataclysm or dark period (is_cataclysm: true).
Use names from the cultural traditions specified in the variety constraints.
Avoid ALL words from the banned list.

{JSON_ONLY}"#,
        project = input.project_name,
        constraints = input.constraints,
        count = input.count,
    )
}

pub(crate) fn factions_prompt(input: &PromptInputs<'_>) -> String {
    format!(
        r#"You are designing factions for a dark fantasy game with deep political intrigue.

{constraints}

{context}

TONE: No faction is purely good or evil. Everyone has reasons for their actions.

Generate {count} distinct factions. Include a mix of:
- At least one nation/kingdom
- At least one religious order or cult
- At least one secretive group (assassins, merchants, scholars)
- At least one fallen or disgraced faction

Return your response as valid JSON in this exact format:
{{
    "factions": [
        {{
            "name": "Faction name (use cultural naming from constraints)",
            "type": "kingdom/order/guild/cult/alliance",
            "ideology": "Core belief or goal in one sentence",
            "public_face": "How they present themselves to others",
            "hidden_truth": "What they hide or deny about themselves",
            "origins": "How this faction came to be (link to eras if possible)",
            "territory": "Where they are based or operate",
            "leaders": ["Name 1", "Name 2"],
            "rivals": ["Faction name they oppose"],
            "allies": ["Faction name they work with"],
            "internal_conflict": "What threatens them from within",
            "resources": "What gives them power (gold, magic, information, faith)",
            "dark_secret": "The worst thing they have done or will do"
        }}
    ],
    "territories": [
        {{
            "name": "Region name",
            "controlled_by": "Faction name",
            "description": "One sentence about the land and its people"
        }}
    ]
}}

Ensure factions have complex relationships; some could be temporary allies despite philosophical differences.
Avoid generic faction names like "The Order of..." or "Brotherhood of...".
Make at least one faction sympathetic despite terrible methods.

{JSON_ONLY}"#,
        constraints = input.constraints,
        context = input.context,
        count = input.count,
    )
}

pub(crate) fn characters_prompt(input: &PromptInputs<'_>) -> String {
    let archetypes = ARCHETYPES[..OFFERED_ARCHETYPES].join(", ");
    let names = if input.suggested_names.is_empty() {
        String::new()
    } else {
        format!("\nSuggested names: {}\n", input.suggested_names.join(", "))
    };

    format!(
        r#"You are creating deeply emotional characters for a dark fantasy game.

{constraints}
{names}
{context}

TONE: Characters should feel real, flawed, and sympathetic even when doing terrible things.

Generate {count} main characters. Each should:
- Have a clear psychological archetype from this list: {archetypes}
- Belong to or oppose one of the existing factions
- Have a motivation rooted in the world's history
- Have at least one meaningful relationship (love, hate, family, betrayal)
- Have different fates depending on story route (light/shadow/neutral paths)

Return your response as valid JSON:
{{
    "characters": [
        {{
            "name": "Character name (from cultural pools in constraints)",
            "title": "Optional title or role",
            "archetype": "Primary archetype from the list",
            "age": "Age or apparent age",
            "faction": "Which faction they belong to or once belonged to",
            "faction_role": "Their position or relationship to the faction",
            "backstory": "2-3 sentences about their past, linked to world eras",
            "motivation": "What drives them (revenge, redemption, love, duty, etc.)",
            "inner_demon": "Their psychological wound or flaw",
            "outer_mask": "How they present themselves to others",
            "secret": "What they hide from everyone",
            "beliefs": "What they think is right or true",
            "fate_by_route": {{
                "light": "Their fate on the light/redemption path",
                "shadow": "Their fate on the shadow/vengeance path",
                "neutral": "Their fate on the neutral/truth path"
            }}
        }}
    ],
    "relationships": [
        {{
            "character_a": "Name",
            "character_b": "Name",
            "type": "lovers/rivals/family/mentor/betrayer/allies",
            "history": "How this relationship formed",
            "tension": "What threatens or complicates this bond",
            "route_dependent": true
        }}
    ]
}}

Make at least one pair of former friends now enemies.
Make at least one relationship that could be romance or rivalry depending on player choices.
Avoid "the chosen one" tropes: everyone is shaped by circumstances, not destiny.

{JSON_ONLY}"#,
        constraints = input.constraints,
        context = input.context,
        count = input.count,
    )
}

pub(crate) fn conflicts_prompt(input: &PromptInputs<'_>) -> String {
    format!(
        r#"You are designing the central conflicts for a dark fantasy game.

{constraints}

{context}

TONE: Conflicts should be morally complex, with no clear heroes or villains.
Every conflict should force the player to question what is truly "right."

Generate {count} major conflicts that involve the factions and characters above. Also generate moral dilemmas the player must face.

Return your response as valid JSON:
{{
    "conflicts": [
        {{
            "name": "Conflict name (avoid generic 'The Great War')",
            "type": "war/rebellion/succession/religious/territorial/ideological",
            "factions_involved": ["Faction 1", "Faction 2"],
            "characters_involved": ["Character names affected or leading this conflict"],
            "root_cause": "The real reason this conflict exists (often hidden)",
            "public_narrative": "What each side claims the conflict is about",
            "atrocities": ["Terrible things done by BOTH sides"],
            "innocents_affected": "Who suffers while the powerful fight",
            "possible_resolutions": {{
                "light": "How this ends on the light path",
                "shadow": "How this ends on the shadow path",
                "neutral": "How this ends on the neutral path"
            }},
            "tragedy": "What will be lost no matter the outcome"
        }}
    ],
    "dilemmas": [
        {{
            "name": "Short name for the dilemma",
            "situation": "The impossible choice presented to the player",
            "option_a": "First choice and its consequences",
            "option_b": "Second choice and its consequences",
            "option_c": "Hidden third option (if any)",
            "characters_affected": ["Who is impacted by this choice"],
            "no_right_answer": "Why neither choice is truly 'good'",
            "route_impact": "Which route this pushes the player toward"
        }}
    ],
    "moments_of_light": [
        {{
            "description": "A moment of peace, love, or hope amid the darkness",
            "characters_involved": ["Who shares this moment"],
            "significance": "Why this moment matters emotionally",
            "fragility": "What threatens this moment"
        }}
    ]
}}

Include at least one "moment of light": a glimpse of what could be if the cycle of violence ended.
Make at least one dilemma where helping one person means hurting another you care about.

{JSON_ONLY}"#,
        constraints = input.constraints,
        context = input.context,
        count = input.count,
    )
}

pub(crate) fn routes_prompt(input: &PromptInputs<'_>) -> String {
    format!(
        r#"You are designing the branching narrative structure for a dark fantasy game.

{constraints}

{context}

STYLE: Each path is morally complex and defensible.
Players should agonize over their choices, not just pick "the good ending."

Design THREE main routes with {count} acts/chapters each. Also create:
- Decision points that branch the narrative
- A hidden fourth route with special unlock conditions

Return your response as valid JSON:
{{
    "routes": {{
        "light": {{
            "name": "Thematic name for this route (not just 'Light Path')",
            "philosophy": "What worldview does this route embody",
            "sacrifice": "What must be given up to walk this path",
            "chapters": [
                {{
                    "number": 1,
                    "title": "Chapter title",
                    "summary": "What happens in this chapter",
                    "key_event": "The defining moment",
                    "characters_focus": ["Which characters are central here"],
                    "emotional_beat": "What the player should feel"
                }}
            ],
            "ending": {{
                "name": "Ending title",
                "description": "How the story concludes",
                "fate_summary": "Brief note on character fates",
                "bittersweet_element": "What is lost even in victory"
            }}
        }},
        "shadow": {{ "name": "...", "philosophy": "...", "sacrifice": "...", "chapters": [], "ending": {{}} }},
        "neutral": {{ "name": "...", "philosophy": "...", "sacrifice": "...", "chapters": [], "ending": {{}} }}
    }},
    "decision_points": [
        {{
            "name": "Decision point name",
            "when": "Which chapter or moment this occurs",
            "situation": "The choice presented",
            "options": [
                {{
                    "choice": "What the player chooses",
                    "leads_to": "light/shadow/neutral",
                    "immediate_consequence": "What happens right after",
                    "long_term_effect": "How this shapes the story"
                }}
            ],
            "can_be_reversed": false,
            "characters_affected": ["Who is impacted by this choice"]
        }}
    ],
    "hidden_route": {{
        "name": "Name of the secret fourth route",
        "unlock_conditions": ["What the player must do to access this route"],
        "philosophy": "What truth this route reveals",
        "unique_revelation": "What is learned only on this path",
        "ending_hint": "A teaser of how this route concludes"
    }}
}}

Each route should feel like a valid, tragic, morally defensible choice.
The "neutral" path should NOT be a compromise; it should be its own philosophy.

{JSON_ONLY}"#,
        constraints = input.constraints,
        context = input.context,
        count = input.count,
    )
}
