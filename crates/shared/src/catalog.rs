//! Static screening catalogs: risk factors, auditory milestones and test sounds.

use serde::Serialize;

/// A titled group of selectable items, one wizard page.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Category {
    pub title: &'static str,
    pub items: &'static [&'static str],
}

pub const HIGH_RISK_FACTORS: &[Category] = &[
    Category {
        title: "Family and Genetic History",
        items: &[
            "Parents are blood relatives (consanguineous marriage).",
            "There is a family history of childhood hearing loss.",
            "The child has a known genetic condition or syndrome linked to hearing loss (e.g., Waardenburg, Pendred, BOR syndrome).",
        ],
    },
    Category {
        title: "During Pregnancy",
        items: &[
            "The mother had a serious illness or high fever during pregnancy.",
            "The mother took medications known to affect hearing (such as aminoglycosides).",
            "The mother consumed alcohol or tobacco during pregnancy.",
            "There was an attempt to terminate the pregnancy.",
            "The mother had infections like rubella, cytomegalovirus (CMV), syphilis, toxoplasmosis, herpes, or Zika virus during pregnancy.",
            "The mother had high blood pressure during pregnancy or delivery.",
        ],
    },
    Category {
        title: "At Birth",
        items: &[
            "The baby was born before 36 weeks of pregnancy (premature).",
            "The baby's birth weight was low, especially below 1500 grams.",
            "The baby did not cry immediately after birth.",
            "The baby had jaundice that required special treatment (phototherapy or exchange transfusion).",
            "The baby was admitted to the Neonatal Intensive Care Unit (NICU) for more than 5 days.",
            "The baby required assisted breathing or mechanical ventilation.",
            "The delivery was complicated (breech, prolonged, or difficult labor).",
        ],
    },
    Category {
        title: "Physical and Structural Indicators",
        items: &[
            "Craniofacial anomalies, including those involving the pinna, ear canal, ear tags, ear pits, and temporal bone anomalies.",
            "The baby was born with abnormalities in the head, ears, eyes, lips, or face.",
            "The child shows features of a syndrome that may be associated with hearing problems.",
        ],
    },
    Category {
        title: "Health Conditions After Birth",
        items: &[
            "The child had bacterial meningitis or brain infections (e.g., encephalitis).",
            "The child had illnesses like measles or mumps.",
            "The child had a head injury with unconsciousness, bleeding, or discharge from the ear.",
            "The child has had repeated ear infections lasting more than 3 months.",
            "The child underwent advanced treatments like ECMO (heart-lung bypass machine).",
        ],
    },
];

pub const AUDITORY_MILESTONES: &[Category] = &[
    Category {
        title: "Birth to 3 Months",
        items: &[
            "Arousal from the sleep",
            "In a very quiet environment eye-blink or eye-widening response to soft sounds from noise makers.",
            "Quiets or smiles when you talk.",
            "Makes sounds back and forth with you.",
            "Makes sounds that differ depending on whether they are happy or upset.",
            "Coos makes sounds like ooooo, aahh, and mmmmm.",
            "Turns head or moves eyes in response to sound. May briefly turn toward a sound, especially familiar voices.",
            "Recognizes and responds to familiar voices. Prefers the sound of their mother's voice over others.",
        ],
    },
    Category {
        title: "4 to 6 Months",
        items: &[
            "At 3 to 4 months of age, the infant may begin to show a slow head turn toward a sound source.",
            "By the 4 months the infant begins to turn his or her head towards the sound source in a more consistent, but still wobble, manner.",
            "Giggles and laughs.",
            "Enjoys music and rhythmic sounds. Shows excitement or calms down when listening to music.",
            "Look at objects of interest and follow objects with their eyes.",
            "Reacts to toys that make sounds, like those with bells or music.",
            "Vocalizes during play or with objects in the mouth.",
            "Vocalizes different vowel sounds, sometimes combined with a consonant, like uuuuuummm, aaagoo, or daaa.",
        ],
    },
    Category {
        title: "7 to 9 Months",
        items: &[
            "By 7 months, the child can localize to side sounds",
            "Between 7 and 9 months, the infant begin to identify the precise location of the sound source with direct head turn (can localize to the side and directly below)",
            "Looks at you when you call their name.",
            "Stops for a moment when you say, \"No.\"",
            "Babbles long strings of sounds, like mama, upup, or baba",
            "Enjoys interactive sound-based games. Reacts to games like peek-a-boo or pat-a-cake.",
            "Recognizes the names of some people and objects.",
            "Shows preference for certain sounds. Expresses excitement for favourite songs or familiar voices.",
        ],
    },
    Category {
        title: "10 to 13 Months",
        items: &[
            "By 12 months of age, the curiosity of the child is full-blown and quick localization to an appropriately presented auditory stimulus.",
            "By the end of 13 months of age, the infant is able to localizes to side and below in any plane above or below eye level",
            "By age 10 months, reaches for objects.",
            "Points, waves, and shows or gives objects.",
            "Uses gestures along with sounds. Waves \"bye-bye\" or raises arms to be picked up.",
            "Tries to copy sounds that you make.",
            "Enjoys dancing.",
            "Shows understanding of common phrases. Reacts appropriately to \"no\" or \"want more?\"",
            "Says one or two words, like mama, dada, hi, and bye.",
        ],
    },
    Category {
        title: "13 to 16 Months",
        items: &[
            "Localize to side, below, and indirectly above.",
            "Understands and follows simple instructions. Responds to basic requests like \"come here\" or \"give me the ball.\"",
            "Recognizes and points to familiar objects when named. Can identify everyday items like \"shoe,\" \"cup,\" or \"dog.\"",
            "Imitates sounds and simple words. Tries to repeat new words heard in conversation.",
        ],
    },
    Category {
        title: "By the End of 18 Months",
        items: &[
            "Localizes directly all signals to side, below and above.",
            "Recognize names of familiar people, objects, and body parts.",
            "Follow simple directions accompanied by gestures.",
            "Say as many as 10 words.",
        ],
    },
    Category {
        title: "By the End of 24 Months",
        items: &[
            "Locates directly a sound at any angle.",
            "Use simple phrases, such as \"more milk\".",
            "Ask one- to two-word questions, such as \"Goodbye bye?\"",
            "Follow simple commands and understand simple questions.",
            "Speak about 50 or more words.",
            "Speak well enough to be understood at least half the time by parents and other primary caregivers.",
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LingSound {
    pub sound: &'static str,
    pub ipa: &'static str,
    pub description: &'static str,
}

pub const LING_SIX_SOUNDS: &[LingSound] = &[
    LingSound { sound: "a", ipa: "/ɑ/", description: "as in \"f-a-ther\"" },
    LingSound { sound: "u", ipa: "/u/", description: "as in \"b-oo-t\"" },
    LingSound { sound: "i", ipa: "/i/", description: "as in \"f-ee-t\"" },
    LingSound { sound: "m", ipa: "/m/", description: "as in \"m-o-m\"" },
    LingSound { sound: "s", ipa: "/s/", description: "as in \"s-un\"" },
    LingSound { sound: "sh", ipa: "/ʃ/", description: "as in \"sh-oe\"" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnvironmentalSound {
    pub name: &'static str,
    pub src: &'static str,
}

pub const ENVIRONMENTAL_SOUNDS: &[EnvironmentalSound] = &[
    EnvironmentalSound { name: "Bell", src: "/audio/ling6/bell.mp3" },
    EnvironmentalSound { name: "Rattle", src: "/audio/ling6/rattle.mp3" },
    EnvironmentalSound { name: "Claps", src: "/audio/ling6/claps.mp3" },
];

impl LingSound {
    /// Asset path for the recorded sound. The `u` recording ships as `o.mp3`.
    pub fn asset_path(&self) -> String {
        let file = if self.sound == "u" { "o" } else { self.sound };
        format!("/audio/ling6/{file}.mp3")
    }

    pub fn generation_prompt(&self) -> String {
        format!(
            "Phoneme: say the isolated speech sound {} {}, once, clearly and at a steady volume.",
            self.ipa, self.description
        )
    }
}

impl EnvironmentalSound {
    pub fn generation_prompt(&self) -> String {
        format!(
            "Sound: produce a short, clear recording of a {} with no speech.",
            self.name.to_ascii_lowercase()
        )
    }
}

pub fn ling_sound(sound: &str) -> Option<&'static LingSound> {
    LING_SIX_SOUNDS.iter().find(|s| s.sound == sound)
}

pub fn environmental_sound(name: &str) -> Option<&'static EnvironmentalSound> {
    ENVIRONMENTAL_SOUNDS
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
}

pub fn total_items(categories: &[Category]) -> usize {
    categories.iter().map(|c| c.items.len()).sum()
}
