use criterion::{criterion_group, criterion_main, measurement::WallTime, BenchmarkGroup, Criterion};
use equihash::{Equihash, EquihashBuilder, Header, RuntimeOption, HEADER_LEN};

/// Reduced parameter sets small enough to solve many times
const PARAMS: [(u32, u32); 2] = [(48, 3), (96, 5)];

// Benchmark each runtime on each parameter set
fn equihash_bench(c: &mut Criterion) {
    let runtimes = [RuntimeOption::Sequential, RuntimeOption::Parallel];
    bench_solve(&mut c.benchmark_group("solve"), &runtimes);
    bench_verify(&mut c.benchmark_group("verify"));
}

/// Headers differing only in the nonce
fn headers() -> Vec<Header> {
    (0..16u8)
        .map(|nonce| {
            let mut bytes = [0u8; HEADER_LEN];
            bytes[108] = nonce;
            Header::from_bytes(&bytes).unwrap()
        })
        .collect()
}

fn solver(n: u32, k: u32, runtime: RuntimeOption) -> Equihash {
    EquihashBuilder::new()
        .params(n, k)
        .runtime(runtime)
        .build()
        .unwrap()
}

fn bench_solve(group: &mut BenchmarkGroup<'_, WallTime>, runtimes: &[RuntimeOption]) {
    group.sample_size(10);
    let headers = headers();
    for (n, k) in PARAMS {
        for runtime in runtimes {
            let solver = solver(n, k, *runtime);

            // Fresh tables for every solve
            let mut next = headers.iter().cycle();
            group.bench_function(format!("{n}-{k}-{runtime}"), |b| {
                b.iter(|| solver.solve(next.next().unwrap()).unwrap());
            });

            // Tables allocated once and cleared between solves
            let mut mem = solver.memory();
            let mut next = headers.iter().cycle();
            group.bench_function(format!("{n}-{k}-{runtime}-reuse"), |b| {
                b.iter(|| {
                    solver
                        .solve_with_memory(next.next().unwrap(), &mut mem)
                        .unwrap()
                });
            });
        }
    }
}

fn bench_verify(group: &mut BenchmarkGroup<'_, WallTime>) {
    // Solving isn't timed here, collect a pool of solutions up front
    for (n, k) in PARAMS {
        let solver = solver(n, k, RuntimeOption::Parallel);
        let mut choices = Vec::new();
        for header in headers() {
            for solution in solver.solve(&header).unwrap() {
                choices.push((header, solution));
            }
        }
        if choices.is_empty() {
            continue;
        }
        let mut next = choices.iter().cycle();
        group.bench_function(format!("{n}-{k}"), |b| {
            b.iter(|| {
                let (header, solution) = next.next().unwrap();
                solver.verify_solution(header, solution).unwrap();
            });
        });
    }
}

criterion_group!(benches, equihash_bench);
criterion_main!(benches);
