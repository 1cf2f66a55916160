use super::dto::{DietGoal, Gender, JobActivity, MacroTargets, UserProfile};

/// Extra daily energy for lactation.
const NURSING_BONUS_KCAL: f64 = 350.0;

struct BodyDefaults {
    weight_kg: f64,
    height_cm: f64,
    age: f64,
}

const MALE_DEFAULTS: BodyDefaults = BodyDefaults {
    weight_kg: 60.0,
    height_cm: 170.0,
    age: 30.0,
};

const FEMALE_DEFAULTS: BodyDefaults = BodyDefaults {
    weight_kg: 50.0,
    height_cm: 160.0,
    age: 30.0,
};

/// Activity factor in tenths, so 1.2 stays exact in the multiplication.
fn activity_factor_tenths(job: JobActivity) -> f64 {
    match job {
        JobActivity::Heavy => 17.0,
        JobActivity::Walk => 15.0,
        JobActivity::Desk | JobActivity::Drive => 12.0,
    }
}

fn or_default(value: f64, default: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        default
    }
}

fn effective_weight_kg(profile: &UserProfile) -> f64 {
    or_default(profile.target_weight_kg, defaults_for(profile.gender).weight_kg)
}

fn defaults_for(gender: Gender) -> &'static BodyDefaults {
    match gender {
        Gender::Male => &MALE_DEFAULTS,
        Gender::Female | Gender::Other => &FEMALE_DEFAULTS,
    }
}

/// Mifflin-St Jeor basal metabolic rate, using population defaults for unset fields.
pub fn basal_metabolic_rate(profile: &UserProfile) -> f64 {
    let d = defaults_for(profile.gender);
    let weight = effective_weight_kg(profile);
    let height = or_default(profile.height_cm, d.height_cm);
    let age = or_default(f64::from(profile.age), d.age);
    let sex_term = if profile.gender == Gender::Male { 5.0 } else { -161.0 };
    10.0 * weight + 6.25 * height - 5.0 * age + sex_term
}

/// Daily calorie and PFC targets for a profile.
///
/// Custom targets replace the computation entirely when the goal is
/// [`DietGoal::Other`].
pub fn targets(profile: &UserProfile) -> MacroTargets {
    if profile.goal == DietGoal::Other {
        if let Some(custom) = profile.custom_targets {
            return custom;
        }
    }

    let bmr = basal_metabolic_rate(profile);
    let mut calories = (bmr * activity_factor_tenths(profile.job_activity) / 10.0).round();
    if profile.goal == DietGoal::PostpartumNursing {
        calories += NURSING_BONUS_KCAL;
    }
    let calories = calories.max(0.0);

    MacroTargets {
        calories: calories as u32,
        protein: (effective_weight_kg(profile) * 1.5).round() as u32,
        fat: (calories * 0.25 / 9.0).round() as u32,
        carbs: (calories * 0.5 / 4.0).round() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::dto::LifestyleActivity;

    fn profile(gender: Gender, weight: f64, height: f64, age: u32, job: JobActivity) -> UserProfile {
        UserProfile {
            patient_id: "P-1".into(),
            name: "Test".into(),
            gender,
            target_weight_kg: weight,
            height_cm: height,
            age,
            job_activity: job,
            ..UserProfile::empty()
        }
    }

    #[test]
    fn desk_male_scenario_yields_1907_kcal() {
        let p = profile(Gender::Male, 70.0, 175.0, 42, JobActivity::Desk);
        assert_eq!(basal_metabolic_rate(&p), 1588.75);
        let t = targets(&p);
        assert_eq!(t.calories, 1907);
        assert_eq!(t.protein, 105);
        assert_eq!(t.fat, 53);
        assert_eq!(t.carbs, 238);
    }

    #[test]
    fn activity_factor_follows_job() {
        let base = profile(Gender::Female, 55.0, 160.0, 35, JobActivity::Desk);
        let bmr = basal_metabolic_rate(&base);
        for (job, factor) in [
            (JobActivity::Desk, 1.2),
            (JobActivity::Drive, 1.2),
            (JobActivity::Walk, 1.5),
            (JobActivity::Heavy, 1.7),
        ] {
            let p = UserProfile { job_activity: job, ..base.clone() };
            assert_eq!(f64::from(targets(&p).calories), (bmr * factor).round(), "{job:?}");
        }
    }

    #[test]
    fn lifestyle_activity_does_not_change_targets() {
        let a = profile(Gender::Male, 70.0, 175.0, 42, JobActivity::Walk);
        let b = UserProfile { lifestyle_activity: LifestyleActivity::High, ..a.clone() };
        assert_eq!(targets(&a), targets(&b));
    }

    #[test]
    fn nursing_adds_350_kcal() {
        let base = profile(Gender::Female, 52.0, 158.0, 31, JobActivity::Desk);
        let nursing = UserProfile { goal: DietGoal::PostpartumNursing, ..base.clone() };
        assert_eq!(targets(&nursing).calories, targets(&base).calories + 350);
    }

    #[test]
    fn custom_targets_are_returned_unchanged() {
        let custom = MacroTargets { calories: 1234, protein: 77, fat: 41, carbs: 150 };
        let p = UserProfile {
            goal: DietGoal::Other,
            custom_targets: Some(custom),
            ..profile(Gender::Male, 70.0, 175.0, 42, JobActivity::Heavy)
        };
        assert_eq!(targets(&p), custom);
    }

    #[test]
    fn custom_targets_ignored_for_other_goals() {
        let base = profile(Gender::Male, 70.0, 175.0, 42, JobActivity::Desk);
        let p = UserProfile {
            goal: DietGoal::Diabetes,
            custom_targets: Some(MacroTargets::CUSTOM_DEFAULT),
            ..base.clone()
        };
        assert_eq!(targets(&p), targets(&base));
    }

    #[test]
    fn unset_fields_use_population_defaults() {
        let male = profile(Gender::Male, 0.0, 0.0, 0, JobActivity::Desk);
        assert_eq!(basal_metabolic_rate(&male), 10.0 * 60.0 + 6.25 * 170.0 - 150.0 + 5.0);
        let female = profile(Gender::Female, 0.0, 0.0, 0, JobActivity::Desk);
        assert_eq!(basal_metabolic_rate(&female), 10.0 * 50.0 + 6.25 * 160.0 - 150.0 - 161.0);
        assert_eq!(targets(&female).protein, 75);
    }
}
