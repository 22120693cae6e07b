//! Benchmarks for format runs against an in-process service.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use livefmt::editor::EditorState;
use livefmt::pipeline::FormatOrchestrator;
use livefmt::service::{BufferArena, FormatService, Handle, ServiceError};

struct Echo {
    arena: BufferArena,
}

impl FormatService for Echo {
    fn default_config(&self) -> Result<Option<Handle>, ServiceError> {
        Ok(Some(self.arena.alloc(b"IndentWidth: 2".as_slice())))
    }

    fn format(&self, source: &str, _config: &str) -> Result<Option<Handle>, ServiceError> {
        Ok(Some(self.arena.alloc(source.as_bytes())))
    }

    fn read(&self, handle: &Handle) -> Result<String, ServiceError> {
        self.arena.read(handle)
    }

    fn release(&self, handle: Handle) {
        let _ = self.arena.free(handle);
    }
}

fn cmake_source(targets: usize) -> String {
    (0..targets)
        .map(|i| {
            format!(
                "add_library(target{i} STATIC\n    src/a{i}.cpp\n    src/b{i}.cpp)\n\
                 target_link_libraries(target{i} PRIVATE core)\n"
            )
        })
        .collect()
}

fn bench_run(c: &mut Criterion, name: &str, targets: usize) {
    let service = Echo {
        arena: BufferArena::new(),
    };
    let mut editor = EditorState::new();
    editor.set_source(&cmake_source(targets));
    editor.set_config("IndentWidth: 4\nColumnLimit: 80");
    let mut orchestrator = FormatOrchestrator::new();

    c.bench_function(name, |b| {
        b.iter(|| orchestrator.run(black_box(&service), &mut editor));
    });
}

fn bench_run_small(c: &mut Criterion) {
    bench_run(c, "run_small", 10);
}

fn bench_run_large(c: &mut Criterion) {
    bench_run(c, "run_large", 2_000);
}

criterion_group!(benches, bench_run_small, bench_run_large);
criterion_main!(benches);
