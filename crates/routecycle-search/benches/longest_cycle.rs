use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use routecycle_core::{PartitionKey, PartitionedGraphs, RouteGraph};
use routecycle_search::{find_longest_routing_cycle, longest_cycle};

/// Ring of `n` nodes where every node also links two steps ahead.
fn chorded_ring(n: usize) -> RouteGraph {
    let names: Vec<String> = (0..n).map(|i| format!("N{i}")).collect();
    let mut graph = RouteGraph::new();
    for i in 0..n {
        graph.add_edge(&names[i], &names[(i + 1) % n]);
        graph.add_edge(&names[i], &names[(i + 2) % n]);
    }
    graph
}

/// Many small partitions, each a short ring with a dangling tail.
fn many_partitions(count: usize) -> PartitionedGraphs {
    let mut graphs = PartitionedGraphs::new();
    for p in 0..count {
        let key = PartitionKey::new(format!("CLM{p}"), "200");
        let ring = 3 + p % 5;
        for i in 0..ring {
            graphs.add_edge(key.clone(), &format!("R{i}"), &format!("R{}", (i + 1) % ring));
        }
        graphs.add_edge(key, "R0", "TAIL");
    }
    graphs
}

fn bench_longest_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("search.chorded_ring");

    for n in [8_usize, 16, 24] {
        let graph = chorded_ring(n);
        group.throughput(Throughput::Elements(graph.edge_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &graph, |b, graph| {
            b.iter(|| black_box(longest_cycle(graph)));
        });
    }

    group.finish();
}

fn bench_reduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("search.partitions");

    for count in [100_usize, 1_000, 10_000] {
        let graphs = many_partitions(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &graphs, |b, graphs| {
            b.iter(|| black_box(find_longest_routing_cycle(graphs)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_longest_cycle, bench_reduction);
criterion_main!(benches);
