use crate::infra::in_memory_service;
use chrono::NaiveDate;
use clap::Args;
use deepcx::error::AppError;
use deepcx::surveys::domain::{CampaignType, RequestMetadata, ResponseSubmission};
use deepcx::surveys::{
    DateRange, InstanceDraft, ResponseCsvImporter, SurveyDraft, SurveyId, SurveyMethod,
    SurveyMetrics, SurveySettings, SurveyStatus,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

const NPS_PATTERN: [i64; 10] = [10, 9, 8, 9, 6, 10, 7, 3, 9, 8];
const FIVE_POINT_PATTERN: [i64; 8] = [5, 4, 4, 3, 5, 2, 4, 1];
const RATING_PATTERN: [f64; 5] = [3.0, 2.0, 3.0, 1.0, 2.0];

#[derive(Args, Debug)]
pub(crate) struct MetricsReportArgs {
    /// Response export with a `score` column and optional `created_at` / `attribute:<code>` columns
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Scoring method of the exported survey (NPS, CSAT or STARS)
    #[arg(long)]
    pub(crate) method: SurveyMethod,
    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) from: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) to: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Scoring method for the demo survey (NPS, CSAT or STARS)
    #[arg(long, default_value = "NPS")]
    pub(crate) method: SurveyMethod,
    /// Number of synthetic responses to submit
    #[arg(long, default_value_t = 12)]
    pub(crate) responses: usize,
    /// Branding color for the demo survey
    #[arg(long)]
    pub(crate) primary_color: Option<String>,
}

pub(crate) fn run_metrics_report(args: MetricsReportArgs) -> Result<(), AppError> {
    let MetricsReportArgs {
        csv,
        method,
        from,
        to,
    } = args;

    let imported = ResponseCsvImporter::from_path(&csv, method)?;
    let range = (from.is_some() || to.is_some()).then_some(DateRange { from, to });
    let label = csv.display().to_string();
    let metrics = imported.metrics(SurveyId(label.clone()), range.as_ref());

    println!("Response export {label}");
    println!(
        "- {} rows read | {} in window",
        imported.len(),
        metrics.total_responses
    );
    render_metrics(&metrics);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        method,
        responses,
        primary_color,
    } = args;

    let service = in_memory_service(SurveySettings::default())?;
    let catalogue = service.attribute_catalogue(None)?;
    let pick = |code: &str| {
        catalogue
            .iter()
            .find(|attribute| attribute.code == code)
            .cloned()
    };
    let rated: Vec<_> = ["service", "wait_time"]
        .into_iter()
        .filter_map(pick)
        .collect();

    let mut draft = SurveyDraft::new("Store visit feedback");
    draft.set_method(method);
    draft.primary_color = primary_color.unwrap_or_default();
    for (index, attribute) in rated.iter().enumerate() {
        draft.select_attribute(&attribute.id);
        draft.set_required(&attribute.id, index == 0);
    }

    println!("DeepCX survey demo");
    let created = service.create_survey(&draft, Some("demo@deepcx.local".to_string()))?;
    let survey = service.set_status(&created.survey.id, SurveyStatus::Active)?;
    let instance = service.create_instance(
        &survey.id,
        InstanceDraft {
            name: Some("Front entrance".to_string()),
            campaign_type: CampaignType::Qr,
            qr_location: Some("Entrance door".to_string()),
            ..InstanceDraft::default()
        },
    )?;

    let page = service.load_public_survey(&survey.survey_code, &instance.instance_code)?;
    println!(
        "- {} survey \"{}\" published at /s/{}/{}",
        survey.method.label(),
        survey.title,
        survey.survey_code,
        instance.instance_code
    );
    println!(
        "- question: {} ({}-{})",
        page.survey.main_question, page.min_score, page.max_score
    );
    println!(
        "- branding {} with {} text",
        page.survey.branding.primary_color, page.text_color
    );
    for attribute in &page.attributes {
        let marker = if attribute.is_required { " (required)" } else { "" };
        println!("  - rate {}{}", attribute.attribute.label, marker);
    }

    let pattern: &[i64] = match method {
        SurveyMethod::Nps => &NPS_PATTERN,
        SurveyMethod::Csat | SurveyMethod::Stars => &FIVE_POINT_PATTERN,
    };
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    let mut partial_ratings = 0;
    for index in 0..responses {
        let mut submission = ResponseSubmission {
            survey_id: survey.id.clone(),
            instance_id: Some(instance.id.clone()),
            main_score: Some(pattern[index % pattern.len()]),
            ..ResponseSubmission::default()
        };
        for (offset, attribute) in rated.iter().enumerate() {
            let rating = RATING_PATTERN[(index + offset) % RATING_PATTERN.len()];
            submission
                .attribute_scores
                .insert(attribute.id.clone(), rating);
        }

        let metadata = RequestMetadata {
            ip_address: format!("198.51.100.{}", index % 250 + 1),
            user_agent: "deepcx-demo".to_string(),
        };
        let receipt = service.submit_response(submission, metadata)?;
        if !receipt.ratings_recorded {
            partial_ratings += 1;
        }
        *buckets.entry(receipt.label).or_default() += 1;
    }

    println!("\nCollected {responses} responses");
    for (label, count) in &buckets {
        println!("  - {label}: {count}");
    }
    if partial_ratings > 0 {
        println!("  - {partial_ratings} responses saved without attribute ratings");
    }

    if let Some(required) = page.attributes.iter().find(|attribute| attribute.is_required) {
        let incomplete = ResponseSubmission {
            survey_id: survey.id.clone(),
            instance_id: Some(instance.id.clone()),
            main_score: Some(pattern[0]),
            ..ResponseSubmission::default()
        };
        if let Err(err) = service.submit_response(incomplete, RequestMetadata::default()) {
            println!(
                "- submission skipping \"{}\" rejected: {err}",
                required.attribute.label
            );
        }
    }

    let metrics = service.compute_metrics(&survey.id, None)?;
    println!();
    render_metrics(&metrics);
    for average in &metrics.attribute_averages {
        let label = page
            .attributes
            .iter()
            .find(|attribute| attribute.attribute.id == average.attribute_id)
            .map(|attribute| attribute.attribute.label.as_str())
            .unwrap_or(average.attribute_id.0.as_str());
        println!(
            "  - {label}: {:.2} / 3 over {} ratings",
            average.average, average.samples
        );
    }

    Ok(())
}

fn render_metrics(metrics: &SurveyMetrics) {
    println!("{} metrics", metrics.method.label());
    println!("- total responses: {}", metrics.total_responses);
    if let (Some(score), Some(breakdown)) = (metrics.nps_score, metrics.nps_breakdown) {
        println!(
            "- NPS {score} | {} promoters, {} passives, {} detractors",
            breakdown.promoters, breakdown.passives, breakdown.detractors
        );
    }
    if let (Some(average), Some(rate), Some(satisfied)) = (
        metrics.csat_average,
        metrics.satisfaction_rate,
        metrics.satisfied_count,
    ) {
        println!(
            "- average {average:.2} / {} | {rate}% satisfied ({satisfied} responses at 4 or above)",
            metrics.method.max_score()
        );
    }
    let distribution: Vec<String> = metrics
        .score_distribution
        .iter()
        .map(|(score, count)| format!("{score}:{count}"))
        .collect();
    if !distribution.is_empty() {
        println!("- distribution {}", distribution.join(" "));
    }
}
