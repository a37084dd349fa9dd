//! Skill matching: a deterministic keyword-overlap heuristic, not NLP.

use std::collections::BTreeMap;

use crate::model::{
    Application, MatchDecision, MatchingBlock, MatchingBreakdown, UserProfile, WorkMode,
};
use crate::util::{Timestamp, normalize_text};

/// Flat penalty applied when any hard filter fails.
const HARD_FILTER_PENALTY: i64 = 30;

/// How many matched / gap labels are retained.
const TOP_N: usize = 10;

/// Compute the matching block for an application.
///
/// Returns `None` when no profile exists or the profile has no skills —
/// there is nothing to match against, and absence is more honest than a
/// zero score.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn compute_matching(
    user: Option<&UserProfile>,
    app: &Application,
    t: Timestamp,
) -> Option<MatchingBlock> {
    let user = user?;

    let tags = app
        .notes
        .as_ref()
        .map(|n| n.tags.join(" "))
        .unwrap_or_default();
    let text = normalize_text(&format!(
        "{} {} {} {} {}",
        app.job.role_title,
        app.job.company_name,
        app.job.location_text.as_deref().unwrap_or(""),
        app.vacancy
            .as_ref()
            .and_then(|v| v.raw_description.as_deref())
            .unwrap_or(""),
        tags,
    ));

    // Highest proficiency first; stable sort keeps declaration order on ties.
    let mut skills = user.skills.clone();
    skills.sort_by_key(|s| std::cmp::Reverse(s.level));
    if skills.is_empty() {
        return None;
    }

    let mut matched = Vec::new();
    let mut gaps = Vec::new();
    for skill in &skills {
        let key = normalize_text(&skill.key);
        let label = normalize_text(&skill.label);
        let hit = (!key.is_empty() && text.contains(&key))
            || (!label.is_empty() && text.contains(&label));
        let display = if skill.label.is_empty() {
            skill.key.clone()
        } else {
            skill.label.clone()
        };
        if hit {
            matched.push(display);
        } else {
            gaps.push(display);
        }
    }

    let total = skills.len() as f64;
    let skill_score = ((matched.len() as f64 / total) * 100.0).round() as i64;

    let mut hard_filter_flags = BTreeMap::new();
    let hf = &user.match_settings.hard_filters;
    match app.job.work_mode {
        Some(WorkMode::Remote) if !hf.allow_remote => {
            hard_filter_flags.insert("allowRemote".to_string(), false);
        }
        Some(WorkMode::Hybrid) if !hf.allow_hybrid => {
            hard_filter_flags.insert("allowHybrid".to_string(), false);
        }
        Some(WorkMode::OnSite) if !hf.allow_on_site => {
            hard_filter_flags.insert("allowOnSite".to_string(), false);
        }
        _ => {}
    }

    let mut score = skill_score;
    if hard_filter_flags.values().any(|ok| !ok) {
        score = (score - HARD_FILTER_PENALTY).max(0);
    }

    let decision = if score >= 70 {
        MatchDecision::Match
    } else if score < 35 {
        MatchDecision::Skip
    } else {
        MatchDecision::Maybe
    };

    let has_description = app
        .vacancy
        .as_ref()
        .is_some_and(|v| v.raw_description.is_some());
    let confidence = (0.3
        + if has_description { 0.3 } else { 0.0 }
        + (skills.len() as f64 / 25.0).min(0.4))
    .min(1.0);

    matched.truncate(TOP_N);
    gaps.truncate(TOP_N);

    Some(MatchingBlock {
        decision,
        score,
        breakdown: MatchingBreakdown {
            skills: skill_score,
            ..MatchingBreakdown::default()
        },
        hard_filter_flags,
        matched_skills_top: matched,
        gaps_top: gaps,
        computed_at: t,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HardFilters, Job, UserSkill, Vacancy};

    fn skill(key: &str, label: &str, level: i64) -> UserSkill {
        UserSkill {
            key: key.to_string(),
            label: label.to_string(),
            level,
            years: None,
            evidence: None,
        }
    }

    fn profile(skills: Vec<UserSkill>) -> UserProfile {
        UserProfile {
            skills,
            ..UserProfile::with_defaults(Timestamp::from_millis(0))
        }
    }

    fn react_app() -> Application {
        Application {
            job: Job {
                company_name: "Acme".to_string(),
                role_title: "React Developer".to_string(),
                ..Job::default()
            },
            ..Application::default()
        }
    }

    #[test]
    fn no_profile_means_no_matching() {
        assert!(compute_matching(None, &react_app(), Timestamp::now()).is_none());
    }

    #[test]
    fn empty_skills_means_no_matching() {
        let p = profile(vec![]);
        assert!(compute_matching(Some(&p), &react_app(), Timestamp::now()).is_none());
    }

    #[test]
    fn single_matching_skill_is_a_match() {
        let p = profile(vec![skill("react", "React", 5)]);
        let m = compute_matching(Some(&p), &react_app(), Timestamp::now()).unwrap();
        assert_eq!(m.score, 100);
        assert_eq!(m.decision, MatchDecision::Match);
        assert_eq!(m.matched_skills_top, vec!["React"]);
        assert!(m.gaps_top.is_empty());
        assert_eq!(m.breakdown.skills, 100);
    }

    #[test]
    fn unmatched_skills_become_gaps() {
        let p = profile(vec![
            skill("react", "React", 5),
            skill("kubernetes", "Kubernetes", 3),
        ]);
        let m = compute_matching(Some(&p), &react_app(), Timestamp::now()).unwrap();
        assert_eq!(m.score, 50);
        assert_eq!(m.decision, MatchDecision::Maybe);
        assert_eq!(m.gaps_top, vec!["Kubernetes"]);
    }

    #[test]
    fn hard_filter_failure_subtracts_thirty() {
        let mut p = profile(vec![skill("react", "React", 5)]);
        p.match_settings.hard_filters = HardFilters {
            allow_remote: false,
            ..HardFilters::default()
        };
        let mut app = react_app();
        app.job.work_mode = Some(WorkMode::Remote);

        let m = compute_matching(Some(&p), &app, Timestamp::now()).unwrap();
        assert_eq!(m.score, 70);
        assert_eq!(m.hard_filter_flags.get("allowRemote"), Some(&false));
    }

    #[test]
    fn low_overlap_is_skip() {
        let p = profile(vec![
            skill("go", "Go", 4),
            skill("terraform", "Terraform", 3),
            skill("aws", "AWS", 3),
        ]);
        let m = compute_matching(Some(&p), &react_app(), Timestamp::now()).unwrap();
        assert_eq!(m.score, 0);
        assert_eq!(m.decision, MatchDecision::Skip);
    }

    #[test]
    fn description_raises_confidence() {
        let p = profile(vec![skill("react", "React", 5)]);
        let bare = compute_matching(Some(&p), &react_app(), Timestamp::now()).unwrap();

        let mut app = react_app();
        app.vacancy = Some(Vacancy {
            raw_description: Some("We use React and TypeScript".to_string()),
            role_fingerprint: None,
        });
        let described = compute_matching(Some(&p), &app, Timestamp::now()).unwrap();
        assert!(described.confidence > bare.confidence);
        assert!(described.confidence <= 1.0);
    }

    #[test]
    fn skills_evaluated_by_descending_level() {
        let p = profile(vec![
            skill("junior", "Junior Thing", 1),
            skill("react", "React", 5),
        ]);
        let mut app = react_app();
        app.vacancy = Some(Vacancy {
            raw_description: Some("react and junior thing welcome".to_string()),
            role_fingerprint: None,
        });
        let m = compute_matching(Some(&p), &app, Timestamp::now()).unwrap();
        // level 5 skill comes first in the retained labels
        assert_eq!(m.matched_skills_top, vec!["React", "Junior Thing"]);
    }
}
