//! # typeflow 性能基准测试
//!
//! 使用 Criterion.rs 进行性能基准测试。
//!
//! ## 基准测试分组
//! - `parse`: 词法与语法分析
//! - `infer`: 建图并传播到不动点
//!
//! ## 使用方法
//! ```bash
//! cargo bench          # 运行所有
//! cargo bench infer    # 只运行推断测试
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fmt::Write;
use std::hint::black_box;
use typeflow::check_source;
use typeflow::frontend::parser::parse_source;
use typeflow::util::config::AnalyzerConfig;

/// 生成 `n` 个相互调用的类与函数
fn generate_program(n: usize) -> String {
    let mut src = String::new();
    for i in 0..n {
        let _ = write!(
            src,
            "class Node{i}(object):\n\
             \x20   def __init__(self, value):\n\
             \x20       self.value = value\n\
             \x20       self.children = []\n\
             \x20   def add(self, child):\n\
             \x20       self.children.append(child)\n\
             \x20       return self\n\
             \x20   def total(self):\n\
             \x20       t = self.value\n\
             \x20       for c in self.children:\n\
             \x20           t = t + c.total()\n\
             \x20       return t\n\
             def build{i}(k):\n\
             \x20   root = Node{i}(k)\n\
             \x20   for j in range(k):\n\
             \x20       root.add(Node{i}(j * 2.0))\n\
             \x20   d = {{'sum': root.total()}}\n\
             \x20   return d.get('sum', 0)\n\
             r{i} = build{i}({i})\n",
        );
    }
    src
}

fn config() -> AnalyzerConfig {
    AnalyzerConfig {
        use_default_path: false,
        ..AnalyzerConfig::default()
    }
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for n in [10, 50] {
        let src = generate_program(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &src, |b, src| {
            b.iter(|| parse_source(black_box(src), "bench"))
        });
    }
    group.finish();
}

fn bench_infer(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer");
    group.sample_size(20);
    let config = config();
    for n in [10, 50] {
        let src = generate_program(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &src, |b, src| {
            b.iter(|| check_source("bench", black_box(src), &config))
        });
    }
    group.finish();
}

fn bench_fibonacci(c: &mut Criterion) {
    let src = "def fib(n):\n    if n < 2:\n        return n\n    return fib(n - 1) + fib(n - 2)\nx = fib(30)\n";
    let config = config();
    c.bench_function("infer_fibonacci", |b| {
        b.iter(|| check_source("fib", black_box(src), &config))
    });
}

criterion_group!(parse, bench_parse);
criterion_group!(infer, bench_infer, bench_fibonacci);
criterion_main!(parse, infer);
