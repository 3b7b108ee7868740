use action_router::dispatcher::{MethodTable, SimpleHandlerProxy};
use action_router::router::{parse_url, WebRouter};
use action_router::server::{RouteRequest, RouteResponse};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn actions(name: &str) -> bool {
    matches!(name, "user" | "report" | "admin/user")
}

fn methods(action: &str, method: &str) -> bool {
    matches!(
        (action, method),
        ("user", "login") | ("report", "view") | ("admin/user", "list")
    )
}

fn bench_parse_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_url");
    for path in [
        "/user/login",
        "/report/view/2024/10",
        "/admin/user/list/active/page/3",
        "/missing/a/b/c",
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(path), path, |b, path| {
            b.iter(|| parse_url(black_box(path), actions, methods))
        });
    }
    group.finish();
}

fn bench_route(c: &mut Criterion) {
    let mut table = MethodTable::<()>::new();
    table.method("view", |_, req, res| {
        res.set_data_by_json(&serde_json::json!(req.params()));
        Ok(())
    });
    let router = WebRouter::builder()
        .web_root("tests/staticdata")
        .handler("report", SimpleHandlerProxy::with_methods((), table))
        .build()
        .expect("router builds");

    c.bench_function("route_dynamic", |b| {
        let req = RouteRequest::get("/report/view/2024/10");
        b.iter(|| {
            let mut res = RouteResponse::new();
            router.route(black_box(&req), &mut res);
            res
        })
    });
}

criterion_group!(benches, bench_parse_url, bench_route);
criterion_main!(benches);
