use anyhow::Context as _;
use anyhow::Result;
use rand::SeedableRng as _;
use rand_distr::Distribution as _;
use rand_distr::Normal;
use rand_distr::Uniform;
use rand_pcg::Pcg64;
use std::env;
use std::fs;
use std::io;
use std::io::Write as _;

const USAGE: &str = "Usage: points-gen [options] >positions.tsv

Each -d DEFINITION contributes an equal share of the points:
    uniform,WIDTH,HEIGHT      uniform field over [0,WIDTH]x[0,HEIGHT]
    cluster,X,Y,STD_DEV       gaussian cluster around (X,Y)";

enum Field {
    Uniform { x: Uniform<f64>, y: Uniform<f64> },
    Cluster { x: Normal<f64>, y: Normal<f64> },
}

fn parse_field(s: &str) -> Result<Field> {
    let mut code = s.split(',');
    let name = code.next().context("empty definition")?;
    let mut args = code.zip(1..).map(|(part, i)| {
        let arg = part
            .parse::<f64>()
            .with_context(|| format!("arg #{i} is invalid"))?;
        anyhow::ensure!(arg.is_finite(), "arg #{i} is not finite");
        Ok(arg)
    });
    let mut require = || args.next().context("not enough arguments")?;
    Ok(match name {
        "uniform" => {
            let width = require()?;
            let height = require()?;
            Field::Uniform {
                x: Uniform::new_inclusive(0.0, width)?,
                y: Uniform::new_inclusive(0.0, height)?,
            }
        }
        "cluster" => {
            let center_x = require()?;
            let center_y = require()?;
            let std_dev = require()?;
            Field::Cluster {
                x: Normal::new(center_x, std_dev)?,
                y: Normal::new(center_y, std_dev)?,
            }
        }
        _ => anyhow::bail!("unknown distribution {name:?}"),
    })
}

impl Field {
    fn sample(&self, rng: &mut Pcg64) -> (f64, f64) {
        match self {
            Field::Uniform { x, y } => (x.sample(rng), y.sample(rng)),
            Field::Cluster { x, y } => (x.sample(rng), y.sample(rng)),
        }
    }
}

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optflag("h", "help", "print this help menu");
    options.optmulti(
        "d",
        "distribution",
        "definition of a point distribution, see DISTRIBUTION",
        "DEFINITION",
    );
    options.optopt("n", "points", "number of points to generate", "COUNT");
    options.optopt("o", "output", "output file (default: stdout)", "FILE");
    options.optopt("s", "seed", "64-bit seed for experiment reproduction", "INTEGER");

    let matches = options.parse(env::args().skip(1))?;

    if matches.opt_present("h") {
        eprintln!("{}", options.usage(USAGE));
        return Ok(());
    }

    let point_count: usize = matches.opt_get("n")?.unwrap_or(10_000);
    anyhow::ensure!(point_count > 0, "-n, --points  must be greater than zero");

    let fields: Vec<Field> = match matches.opt_strs("d").as_slice() {
        [] => vec![Field::Uniform {
            x: Uniform::new_inclusive(0.0, 100_000.0)?,
            y: Uniform::new_inclusive(0.0, 100_000.0)?,
        }],
        definitions => definitions
            .iter()
            .map(|definition| {
                parse_field(definition)
                    .with_context(|| format!("invalid distribution {definition:?}"))
            })
            .collect::<Result<_>>()?,
    };

    let mut rng = match matches.opt_get("s")? {
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_os_rng(),
    };

    let output: Box<dyn io::Write> = match matches.opt_str("o") {
        Some(path) => {
            Box::new(fs::File::create(&path).with_context(|| format!("failed to create {path:?}"))?)
        }
        None => Box::new(io::stdout().lock()),
    };
    let mut output = io::BufWriter::new(output);

    for i in 0..point_count {
        let (x, y) = fields[i % fields.len()].sample(&mut rng);
        writeln!(output, "{x}\t{y}")?;
    }
    output.flush()?;

    Ok(())
}
