use crate::inbody::dto::InBodyData;
use crate::meals::dto::NutritionTotals;
use crate::profile::dto::{MacroTargets, UserProfile};

pub const BODY_COMPOSITION: &str = "\
You are reading a photo of a body-composition analyzer result sheet. \
Return one JSON object with these fields: date (YYYY-MM-DD), weightKg, bodyFatPercent, \
muscleMassKg, bmi, visceralFatLevel, score. All values except date are numbers. \
Omit any field you cannot read. Do not add commentary.";

pub fn meal_nutrition(description: &str) -> String {
    format!(
        "Estimate the nutrition of this meal and answer with one JSON object.\n\
         Meal: \"{description}\"\n\
         Fields: calories (kcal), protein (g), fat (g), carbs (g), \
         aiAnalysis (one piece of advice, at most 40 characters)."
    )
}

pub fn daily_score(
    profile: &UserProfile,
    meal_count: usize,
    totals: &NutritionTotals,
    targets: &MacroTargets,
) -> String {
    format!(
        "Evaluate today's diet ({meal_count} meals) for a patient whose goal is {goal}.\n\
         Eaten: {cal:.0} kcal, protein {p:.0} g, fat {f:.0} g, carbs {c:.0} g.\n\
         Targets: {tcal} kcal, protein {tp} g, fat {tf} g, carbs {tc} g.\n\
         Answer with JSON: {{\"score\": number 0-100, \"comment\": \"advice, at most 50 characters\"}}",
        goal = profile.goal,
        cal = totals.calories,
        p = totals.protein,
        f = totals.fat,
        c = totals.carbs,
        tcal = targets.calories,
        tp = targets.protein,
        tf = targets.fat,
        tc = targets.carbs,
    )
}

pub fn daily_tip(profile: &UserProfile, latest: Option<&InBodyData>) -> String {
    let state = match latest {
        Some(entry) => {
            let mut s = format!("Latest measurement: {:.1} kg", entry.weight_kg);
            if let Some(fat) = entry.body_fat_percent {
                s.push_str(&format!(", body fat {fat:.1}%"));
            }
            if let Some(muscle) = entry.muscle_mass_kg {
                s.push_str(&format!(", muscle {muscle:.1} kg"));
            }
            s
        }
        None => "No measurements yet".to_string(),
    };
    format!(
        "You are the in-house diet coach of a bodywork clinic.\n\
         Patient goal: {goal}. Target weight: {target:.1} kg. {state}.\n\
         Write one positive, expert sentence (at most 30 words) about posture or metabolism.",
        goal = profile.goal,
        target = profile.target_weight_kg,
    )
}
