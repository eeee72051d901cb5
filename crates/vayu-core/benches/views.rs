use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vayu_catalog::ZoneId;
use vayu_core::views::{active, archive, archive_years, pending, ArchiveFilter};
use vayu_core::{
    AnalysisId, InterventionProject, PhaseStatus, PhaseTemplate, ProjectCollection, ProjectId,
    ProjectPhase, ProjectStatus,
};

fn make_project(idx: usize) -> InterventionProject {
    let status = match idx % 3 {
        0 => ProjectStatus::PendingApproval,
        1 => ProjectStatus::InProgress,
        _ => ProjectStatus::Completed,
    };
    let phases = (0..4)
        .map(|i| ProjectPhase {
            status: if status == ProjectStatus::Completed || i < idx % 4 {
                PhaseStatus::Completed
            } else {
                PhaseStatus::Pending
            },
            ..ProjectPhase::from_template(PhaseTemplate::new(format!("Phase {i}"), "bench"))
        })
        .collect();
    InterventionProject {
        id: ProjectId::generate(),
        zone_id: ZoneId::new(format!("z-{}", idx % 8)),
        title: format!("Project {idx}"),
        status,
        based_on_analysis_id: AnalysisId::new("an-bench"),
        start_date: NaiveDate::from_ymd_opt(2020 + (idx % 5) as i32, 1, 1).unwrap_or_default(),
        notes: String::new(),
        phases,
    }
}

fn bench_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("views");
    for size in [100usize, 1_000, 10_000] {
        let projects: ProjectCollection = (0..size).map(make_project).collect();
        let zone = ZoneId::new("z-1");

        group.bench_with_input(BenchmarkId::new("pending", size), &projects, |b, p| {
            b.iter(|| black_box(pending(p, &zone).len()));
        });
        group.bench_with_input(BenchmarkId::new("active", size), &projects, |b, p| {
            b.iter(|| black_box(active(p, &zone).len()));
        });
        group.bench_with_input(BenchmarkId::new("archive_2023", size), &projects, |b, p| {
            b.iter(|| black_box(archive(p, &zone, ArchiveFilter::Year(2023)).len()));
        });
        group.bench_with_input(BenchmarkId::new("archive_years", size), &projects, |b, p| {
            b.iter(|| black_box(archive_years(p, &zone)));
        });
    }
    group.finish();
}

fn bench_upsert(c: &mut Criterion) {
    let projects: ProjectCollection = (0..10_000).map(make_project).collect();
    let mut target = projects.iter().nth(5_000).cloned().unwrap_or_else(|| make_project(0));
    target.title = "Renamed".into();
    c.bench_function("upsert_10k", |b| {
        b.iter(|| black_box(projects.upsert(target.clone()).len()));
    });
}

criterion_group!(benches, bench_views, bench_upsert);
criterion_main!(benches);
