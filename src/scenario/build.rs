//! Chart builders for each [ChartKind](super::ChartKind)

use chrono::Local;
use tracing::debug;

use super::chart::{Chart, DoseMarker, LineStyle, SampleSet, Series, SeriesColor};
use super::Scenario;
use crate::data::{Curve, DoseEvent, Schedule, TimeAxis};
use crate::error::CurveError;
use crate::perceived::{perceive_each, perceive_sum};
use crate::report::{format_number, format_time_12h, sample_targets, schedule_filename};
use crate::simulator::{dose_curves, schedule_curve, stop_after_projections, total, EffectMode};

const EPS: f64 = 1e-6;

fn axis_for(scenario: &Scenario, schedules: &[&Schedule]) -> Result<TimeAxis, CurveError> {
    let (start, end) = crate::data::axis::day_bounds(schedules, scenario.default_start);
    TimeAxis::with_resolution(start, end, scenario.resolution_min)
}

fn times(schedule: &Schedule) -> Vec<f64> {
    schedule.doses().iter().map(DoseEvent::time).collect()
}

fn earliest(schedules: &[&Schedule]) -> Option<f64> {
    schedules
        .iter()
        .filter_map(|s| s.first_time())
        .reduce(f64::min)
}

/// `ceil(max * (1 + headroom))`, at least 1
fn y_top(curves: &[&Curve], headroom: f64) -> f64 {
    let max = curves.iter().map(|c| c.peak()).fold(0.0, f64::max);
    (max * (1.0 + headroom)).ceil().max(1.0)
}

fn mode_label(scenario: &Scenario) -> String {
    let rates = scenario.drugs.dex.rates(scenario.mode);
    match scenario.mode {
        EffectMode::Pk => format!("PK (effective half-life) — {rates}"),
        EffectMode::Perceived => format!("Perceived effect — {rates}"),
    }
}

fn caffeine_series(
    scenario: &Scenario,
    axis: &TimeAxis,
    chart: &mut Chart,
) -> Result<Option<usize>, CurveError> {
    let schedule = scenario.caffeine_schedule()?;
    if schedule.is_empty() {
        return Ok(None);
    }
    let curve = schedule_curve(axis, &schedule, &scenario.drugs.caffeine.pk);
    let top = (curve.peak() * 1.1).ceil().max(1.0);
    chart.secondary_axis = Some(("Caffeine (mg, model)".to_string(), top));
    chart.series.push(
        Series::new("Caffeine (PK)", curve, LineStyle::Solid, SeriesColor::Caffeine)
            .width(1.9)
            .opacity(0.75)
            .secondary(),
    );
    Ok(Some(chart.series.len() - 1))
}

fn push(chart: &mut Chart, series: Series) -> usize {
    chart.series.push(series);
    chart.series.len() - 1
}

fn file_name(scenario: &Scenario, vyvanse: &Schedule, dex: &Schedule) -> String {
    schedule_filename(
        scenario.chart.component(),
        Local::now().date_naive(),
        Some(vyvanse),
        Some(dex),
        "svg",
    )
}

fn empty_chart(axis: &TimeAxis, title: String, y_label: &str, file_name: String) -> Chart {
    Chart {
        title,
        x_label: "Hour of Day".to_string(),
        y_label: y_label.to_string(),
        x_range: (axis.start(), axis.end()),
        y_max: 1.0,
        secondary_axis: None,
        series: Vec::new(),
        legend_order: Vec::new(),
        markers: Vec::new(),
        samples: Vec::new(),
        file_name,
    }
}

/// Vyvanse with Dex add-ons, stop-after projections behind the total
pub(super) fn vyvanse_with_dex(scenario: &Scenario) -> Result<Chart, CurveError> {
    let vyvanse = scenario.vyvanse_schedule()?;
    let dex = scenario.dex_schedule()?;
    let caffeine = scenario.caffeine_schedule()?;
    let axis = axis_for(scenario, &[&vyvanse, &dex, &caffeine])?;

    let dex_rates = scenario.drugs.dex.rates(scenario.mode);
    let vyv_curve = schedule_curve(&axis, &vyvanse, &scenario.drugs.vyvanse.pk);
    let dex_parts = dose_curves(&axis, &dex, &dex_rates);
    let dex_times = times(&dex);
    let reference = total(std::iter::once(&vyv_curve).chain(&dex_parts))?;

    let mut chart = empty_chart(
        &axis,
        format!("Vyvanse + Dex Model\nDex IR: {}", mode_label(scenario)),
        "Relative Effect (arbitrary units)",
        file_name(scenario, &vyvanse, &dex),
    );
    chart.y_max = y_top(&[&reference], 0.08);

    // projections first so the total is drawn over them
    for (i, (branch, curve)) in stop_after_projections(&vyv_curve, &dex_parts, &dex_times)?
        .into_iter()
        .enumerate()
    {
        chart.series.push(
            Series::new(
                format!("Stop after {} Dex", format_time_12h(dex_times[i])),
                curve,
                LineStyle::Dotted,
                SeriesColor::Dose(i),
            )
            .width(1.8)
            .opacity(0.85)
            .visible_from(Some(branch)),
        );
    }

    chart.series.push(
        Series::new(
            "Total (Vyvanse + Dex)",
            reference.clone(),
            LineStyle::Solid,
            SeriesColor::Total,
        )
        .width(2.6),
    );
    if !vyvanse.is_empty() {
        let capsules: Vec<String> = scenario
            .vyvanse
            .iter()
            .map(|&[_, capsule]| format!("{}mg", format_number(capsule)))
            .collect();
        chart.series.push(
            Series::new(
                format!(
                    "Vyvanse {} → dex (eq. {}mg)",
                    capsules.join("+"),
                    format_number(vyvanse.total_amount())
                ),
                vyv_curve,
                LineStyle::Solid,
                SeriesColor::Vyvanse,
            )
            .width(2.0),
        );
    }
    let suffix = match scenario.mode {
        EffectMode::Pk => "PK",
        EffectMode::Perceived => "perceived",
    };
    for (i, (dose, curve)) in dex.doses().iter().zip(dex_parts).enumerate() {
        chart.series.push(
            Series::new(
                format!(
                    "Dex IR {}mg @ {} ({suffix})",
                    format_number(dose.amount()),
                    format_time_12h(dose.time())
                ),
                curve,
                LineStyle::Dashed,
                SeriesColor::Dose(i),
            )
            .width(1.8),
        );
        chart.markers.push(DoseMarker {
            time: dose.time(),
            color: SeriesColor::Dose(i),
        });
    }

    let caffeine_idx = caffeine_series(scenario, &axis, &mut chart)?;
    chart.legend_order = caffeine_idx
        .into_iter()
        .chain((0..chart.series.len()).filter(|&i| Some(i) != caffeine_idx))
        .collect();

    chart.samples.push(SampleSet {
        title: "Vyvanse+Dex totals at targets:".to_string(),
        samples: sample_targets(&reference, &scenario.targets),
    });
    debug!(series = chart.series.len(), "built vyvanse-with-dex chart");
    Ok(chart)
}

/// A Dex-only day compared with the Vyvanse + Dex reference total
pub(super) fn dex_only(scenario: &Scenario) -> Result<Chart, CurveError> {
    let vyvanse = scenario.vyvanse_schedule()?;
    let reference_dex = scenario.dex_schedule()?;
    let dex = scenario.dex_only_schedule()?;
    let caffeine = scenario.caffeine_schedule()?;
    let schedules = [&vyvanse, &reference_dex, &dex];
    let axis = axis_for(scenario, &[&vyvanse, &reference_dex, &dex, &caffeine])?;
    let first = earliest(&schedules);

    let dex_rates = scenario.drugs.dex.rates(scenario.mode);
    let vyv_curve = schedule_curve(&axis, &vyvanse, &scenario.drugs.vyvanse.pk);
    let reference_parts = dose_curves(&axis, &reference_dex, &dex_rates);
    let reference = total(std::iter::once(&vyv_curve).chain(&reference_parts))?;

    let dex_parts = dose_curves(&axis, &dex, &dex_rates);
    let dex_times = times(&dex);
    let dex_total = if dex_parts.is_empty() {
        Curve::zeros(&axis)
    } else {
        total(&dex_parts)?
    };

    let mut chart = empty_chart(
        &axis,
        format!(
            "Dex-only Model vs Vyvanse+Dex Reference\nDex IR: {}",
            mode_label(scenario)
        ),
        "Relative Effect (arbitrary units)",
        file_name(scenario, &vyvanse, &dex),
    );
    chart.y_max = y_top(&[&reference, &dex_total], 0.08);

    chart.series.push(
        Series::new(
            "Total (Vyvanse + Dex reference)",
            reference,
            LineStyle::Dotted,
            SeriesColor::Total,
        )
        .width(2.4)
        .visible_from(first),
    );

    let component_start = chart.series.len();
    for (i, (dose, curve)) in dex.doses().iter().zip(&dex_parts).enumerate() {
        chart.series.push(
            Series::new(
                format!(
                    "Dex-only {}mg @ {}",
                    format_number(dose.amount()),
                    format_time_12h(dose.time())
                ),
                curve.clone(),
                LineStyle::Dashed,
                SeriesColor::Dose(i),
            )
            .width(1.6),
        );
    }

    // the first branch would duplicate the first dose curve
    let base = Curve::zeros(&axis);
    let mut stop_after = Vec::new();
    for (i, (branch, curve)) in stop_after_projections(&base, &dex_parts, &dex_times)?
        .into_iter()
        .enumerate()
        .skip(1)
    {
        chart.series.push(
            Series::new(
                format!("Stop after {} Dex", format_time_12h(dex_times[i])),
                curve,
                LineStyle::Dotted,
                SeriesColor::Dose(i),
            )
            .width(1.4)
            .opacity(0.85)
            .visible_from(Some(branch)),
        );
        stop_after.push(chart.series.len() - 1);
    }

    chart.series.push(
        Series::new(
            "Total (Dex-only model)",
            dex_total.clone(),
            LineStyle::Solid,
            SeriesColor::Total,
        )
        .width(2.8)
        .visible_from(first),
    );
    let dex_total_idx = chart.series.len() - 1;

    let first_dex = dex.first_time();
    for (i, dose) in dex.doses().iter().enumerate() {
        if first_dex.is_some_and(|t| (dose.time() - t).abs() < EPS) {
            continue;
        }
        chart.markers.push(DoseMarker {
            time: dose.time(),
            color: SeriesColor::Dose(i),
        });
    }

    let caffeine_idx = caffeine_series(scenario, &axis, &mut chart)?;
    chart.legend_order = caffeine_idx
        .into_iter()
        .chain([0, dex_total_idx])
        .chain(component_start..component_start + dex_parts.len())
        .chain(stop_after)
        .collect();

    chart.samples.push(SampleSet {
        title: "Dex-only model totals at targets:".to_string(),
        samples: sample_targets(&dex_total, &scenario.targets),
    });
    debug!(series = chart.series.len(), "built dex-only chart");
    Ok(chart)
}

/// PK curves (solid) against kernel-derived perceived curves (dotted)
pub(super) fn pk_vs_perceived(scenario: &Scenario) -> Result<Chart, CurveError> {
    let vyvanse = scenario.vyvanse_schedule()?;
    let dex = scenario.dex_schedule()?;
    let caffeine = scenario.caffeine_schedule()?;
    let axis = axis_for(scenario, &[&vyvanse, &dex, &caffeine])?;
    let first = earliest(&[&vyvanse, &dex]);
    let options = &scenario.perceived;
    let kernels = &scenario.kernels;

    let vyv_parts = dose_curves(&axis, &vyvanse, &scenario.drugs.vyvanse.pk);
    let dex_parts = dose_curves(&axis, &dex, &scenario.drugs.dex.pk);
    let dex_times = times(&dex);
    let zeros = Curve::zeros(&axis);
    let vyv_sum = total(std::iter::once(&zeros).chain(&vyv_parts))?;
    let total_pk = total(std::iter::once(&vyv_sum).chain(&dex_parts))?;

    let vyv_pd = perceive_sum(&axis, &vyv_parts, &kernels.vyvanse, options)?;
    let dex_pd_parts = perceive_each(&dex_parts, &kernels.dex, options)?;
    let total_pd = total(std::iter::once(&vyv_pd).chain(&dex_pd_parts))?;

    let mut chart = empty_chart(
        &axis,
        format!(
            "Vyvanse + Dex — PK (solid) vs perceived (dotted) | τr={}h, τd={}h, peak≈{}×PK, clamp≤{}×PK",
            format_number(kernels.dex.tau_rise),
            format_number(kernels.dex.tau_decay),
            format_number(options.peak_scale),
            options
                .clamp_scale
                .map_or_else(|| "∞".to_string(), format_number),
        ),
        "Amphetamine (PK/Perceived; a.u.)",
        file_name(scenario, &vyvanse, &dex),
    );
    chart.y_max = y_top(&[&total_pk], 0.1);

    let pd_samples = sample_targets(&total_pd, &scenario.targets);

    let total_pk_idx = push(
        &mut chart,
        Series::new("Total (PK)", total_pk.clone(), LineStyle::Solid, SeriesColor::Total)
            .width(2.6)
            .visible_from(first),
    );
    let vyv_pk_idx = (!vyvanse.is_empty()).then(|| {
        push(
            &mut chart,
            Series::new("Vyvanse (PK)", vyv_sum.clone(), LineStyle::Solid, SeriesColor::Vyvanse)
                .width(2.0)
                .visible_from(vyvanse.first_time()),
        )
    });
    let mut dex_pk_idx = Vec::new();
    for (i, (dose, curve)) in dex.doses().iter().zip(&dex_parts).enumerate() {
        dex_pk_idx.push(push(
            &mut chart,
            Series::new(
                format!(
                    "Dex {}mg @ {} (PK)",
                    format_number(dose.amount()),
                    format_time_12h(dose.time())
                ),
                curve.clone(),
                LineStyle::Dashed,
                SeriesColor::Dose(i),
            ),
        ));
    }

    let total_pd_idx = push(
        &mut chart,
        Series::new("Total (perceived)", total_pd, LineStyle::Dotted, SeriesColor::Total)
            .width(2.6)
            .opacity(0.9)
            .floor(options.floor)
            .visible_from(first),
    );
    let vyv_pd_idx = (!vyvanse.is_empty()).then(|| {
        push(
            &mut chart,
            Series::new(
                "Vyvanse (perceived)",
                vyv_pd.clone(),
                LineStyle::Dotted,
                SeriesColor::Vyvanse,
            )
            .width(2.0)
            .opacity(0.85)
            .floor(options.floor),
        )
    });
    let mut dex_pd_idx = Vec::new();
    for (i, (dose, curve)) in dex.doses().iter().zip(&dex_pd_parts).enumerate() {
        dex_pd_idx.push(push(
            &mut chart,
            Series::new(
                format!(
                    "Dex {}mg @ {} (perceived)",
                    format_number(dose.amount()),
                    format_time_12h(dose.time())
                ),
                curve.clone(),
                LineStyle::Dotted,
                SeriesColor::Dose(i),
            )
            .opacity(0.8)
            .floor(options.floor),
        ));
    }

    // the last branch is the full total and is not drawn
    let pk_branches = stop_after_projections(&vyv_sum, &dex_parts, &dex_times)?;
    let pd_branches = stop_after_projections(&vyv_pd, &dex_pd_parts, &dex_times)?;
    let mut stop_after_idx = Vec::new();
    for (i, ((branch, pk), (_, pd))) in pk_branches.into_iter().zip(pd_branches).enumerate() {
        let pk_idx = push(
            &mut chart,
            Series::new(
                format!("Stop after Dex {} (PK)", i + 1),
                pk,
                LineStyle::Dashed,
                SeriesColor::Dose(i),
            )
            .width(1.0)
            .opacity(0.6)
            .visible_from(Some(branch)),
        );
        let pd_idx = push(
            &mut chart,
            Series::new(
                format!("Stop after Dex {} (perceived)", i + 1),
                pd,
                LineStyle::Dotted,
                SeriesColor::Dose(i),
            )
            .width(1.0)
            .opacity(0.9)
            .visible_from(Some(branch)),
        );
        stop_after_idx.extend([pk_idx, pd_idx]);
    }

    let caffeine_idx = caffeine_series(scenario, &axis, &mut chart)?;

    let mut legend: Vec<usize> = caffeine_idx.into_iter().collect();
    legend.extend([total_pk_idx, total_pd_idx]);
    legend.extend(vyv_pk_idx);
    legend.extend(vyv_pd_idx);
    legend.extend(dex_pk_idx);
    legend.extend(dex_pd_idx);
    legend.extend(stop_after_idx);
    chart.legend_order = legend;

    let skip = |t: f64| first.is_some_and(|f| (t - f).abs() < EPS);
    for dose in vyvanse.doses() {
        if !skip(dose.time()) {
            chart.markers.push(DoseMarker {
                time: dose.time(),
                color: SeriesColor::Vyvanse,
            });
        }
    }
    for (i, dose) in dex.doses().iter().enumerate() {
        if !skip(dose.time()) {
            chart.markers.push(DoseMarker {
                time: dose.time(),
                color: SeriesColor::Dose(i),
            });
        }
    }

    chart.samples.push(SampleSet {
        title: "Total (PK) at targets:".to_string(),
        samples: sample_targets(&total_pk, &scenario.targets),
    });
    chart.samples.push(SampleSet {
        title: "Total (perceived) at targets:".to_string(),
        samples: pd_samples,
    });
    debug!(series = chart.series.len(), "built pk-vs-perceived chart");
    Ok(chart)
}
