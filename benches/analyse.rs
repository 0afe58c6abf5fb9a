use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use pascalc::{lexer::Lexer, parser};

static INPUT: &str = "
    const
      limit = 30;
    type
      tpoint = record x: integer; y: integer end;
    var
      p: tpoint;
      total: integer;
      i: integer;

    function fib(x: integer): integer;
    begin
      if x = 0 then
        fib := 0
      else if x = 1 then
        fib := 1
      else
        fib := fib(x - 1) + fib(x - 2)
    end;

    procedure accumulate(v: integer);
      function scaled(): integer;
      begin
        scaled := v * 2
      end;
    begin
      total := total + scaled()
    end;

    begin
      total := 0;
      for i := 1 to limit do
        accumulate(fib(i));
      p.x := total;
      p.y := 0;
      while p.y < total do
        p.y := p.y + 1
    end.
";

fn lex(input: &str) {
    let mut lexer = Lexer::new(input);
    let mut count = 0usize;
    loop {
        let token = lexer.lex().unwrap();
        if token.is_eof() {
            break;
        }
        count += 1;
    }
    black_box(count);
}

fn parse(input: &str) {
    let parsed = parser::parse(input).unwrap();
    _ = black_box(parsed);
}

fn analyse(input: &str) {
    let (fragments, symbols) = pascalc::analyse_source(input).unwrap();
    _ = black_box((fragments, symbols));
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("lexer", |b| b.iter(|| lex(black_box(INPUT))));
    c.bench_function("parser", |b| b.iter(|| parse(black_box(INPUT))));
    c.bench_function("analyse", |b| b.iter(|| analyse(black_box(INPUT))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
