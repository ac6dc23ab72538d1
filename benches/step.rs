//! Benchmarks for the population epoch step.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use genalg::{
    compute::{GenomeRng, Population},
    schema::{ConvLayout, NeuraNetLayout, PopulationConfig, VariantKind},
};

/// Score every new genome with a cheap sphere function.
fn evaluate(population: &mut Population) {
    let ranks: Vec<usize> = population.new_ranks().collect();
    for rank in ranks {
        let genome = population.genome(rank);
        let value = -genome.float_genes().iter().map(|g| g * g).sum::<f32>();
        population.set_value(rank, value);
    }
}

fn bench_population_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("population_step");

    for size in [50, 100, 500, 1000] {
        let config = PopulationConfig {
            size,
            elite_count: size / 5,
            float_gene_count: 16,
            int_gene_count: 4,
            float_bounds: vec![(-1.0, 1.0); 16],
            int_bounds: vec![(0, 8); 4],
            ..Default::default()
        };
        let mut rng = GenomeRng::new(0);
        let mut population = Population::from_config(&config).unwrap();
        population.init(&mut rng);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                evaluate(&mut population);
                black_box(population.step(&mut rng));
            });
        });
    }

    group.finish();
}

fn bench_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("variants");

    let variants = [
        ("default", VariantKind::Default),
        (
            "neuranet",
            VariantKind::NeuraNet(NeuraNetLayout {
                inputs: 4,
                hidden: 4,
                outputs: 2,
                mutable_links: true,
            }),
        ),
        (
            "neuranet_conv",
            VariantKind::NeuraNetConv(ConvLayout {
                base_conv: 8,
                bases_per_cell: 2,
            }),
        ),
    ];

    for (name, variant) in variants {
        let config = PopulationConfig {
            size: 100,
            elite_count: 20,
            float_gene_count: 24,
            int_gene_count: 24,
            float_bounds: vec![(-1.0, 1.0); 24],
            variant,
            ..Default::default()
        };
        let mut rng = GenomeRng::new(1);
        let mut population = Population::from_config(&config).unwrap();
        population.init(&mut rng);

        group.bench_function(name, |b| {
            b.iter(|| {
                evaluate(&mut population);
                black_box(population.step(&mut rng));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_population_step, bench_variants);
criterion_main!(benches);
