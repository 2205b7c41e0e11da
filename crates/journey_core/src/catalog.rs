//! crates/journey_core/src/catalog.rs
//!
//! The fixed, ordered catalog of journey steps every application moves through.

/// Number of canonical steps in the journey.
pub const TOTAL_STEPS: u8 = 6;

/// One canonical stage of the application lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JourneyStep {
    pub number: u8,
    pub name: &'static str,
    pub icon: &'static str,
}

pub const JOURNEY_STEPS: [JourneyStep; TOTAL_STEPS as usize] = [
    JourneyStep { number: 1, name: "Initial Consultation", icon: "💬" },
    JourneyStep { number: 2, name: "Profile & University Shortlist", icon: "🎯" },
    JourneyStep { number: 3, name: "Application & Documentation", icon: "📋" },
    JourneyStep { number: 4, name: "Offer & Scholarship", icon: "🎓" },
    JourneyStep { number: 5, name: "Visa & Pre-departure", icon: "🛂" },
    JourneyStep { number: 6, name: "Arrival & Onboarding", icon: "✈️" },
];
