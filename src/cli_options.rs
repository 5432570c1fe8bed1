use std::collections::HashMap;
use std::str::FromStr;

use crate::render::Region;
use crate::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracerKind {
    Path,
    Direct,
    Ftl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub scene_name: String,
    pub tracer: TracerKind,
    pub width: usize,
    pub height: usize,
    pub spp: usize,
    /// 0 means one per available core.
    pub threads: usize,
    pub out: String,
    pub min_depth: usize,
    pub termination_prob: f32,
    pub frames: usize,
    pub fps: f32,
    pub region: Option<Region>,
    pub stratified: bool,
    pub trace_pixel: Option<(usize, usize)>,
    /// Seconds between intermediate saves; 0 disables them.
    pub save_interval: u64,
    pub help: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            scene_name: "cornell".to_string(),
            tracer: TracerKind::Path,
            width: 512,
            height: 512,
            spp: 16,
            threads: 0,
            out: "output.png".to_string(),
            min_depth: 0,
            termination_prob: 0.0,
            frames: 32,
            fps: 10.0,
            region: None,
            stratified: false,
            trace_pixel: None,
            save_interval: 0,
            help: false,
        }
    }
}

impl CliOptions {
    pub fn message() -> &'static str {
        r#"
        --scene <cornell|sphere_over_plane|showcase>
        --tracer <path|direct|ftl>
        --width <pixels> --height <pixels>
        --spp <samples per pixel>
        --threads <count>
        --out <file.png|file.exr>
        --min_depth <bounces> --termination_prob <p>
        --frames <count> --fps <frames per unit of light travel>
        --region <x1,y1,x2,y2>
        --stratified
        --trace_pixel <x,y>
        --save_interval <seconds>
        --help
        "#
    }
}

fn parse_value<T: FromStr>(key: &str, value: Option<String>) -> Result<T, RenderError>
where
    T::Err: std::fmt::Display,
{
    let value = value.ok_or_else(|| RenderError::Options(format!("{} needs a value", key)))?;
    value
        .parse::<T>()
        .map_err(|e| RenderError::Options(format!("{} {:?}: {}", key, value, e)))
}

fn parse_pixel(key: &str, value: Option<String>) -> Result<(usize, usize), RenderError> {
    let text: String = parse_value(key, value)?;
    let mut parts = text.split(',').map(|s| s.trim().parse::<usize>());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), None) => Ok((x, y)),
        _ => Err(RenderError::Options(format!("{} {:?}: expected x,y", key, text))),
    }
}

pub fn parse_args(args: Vec<String>) -> Result<CliOptions, RenderError> {
    let mut pairs: HashMap<String, Option<String>> = HashMap::new();
    let mut args = args.into_iter().rev().collect::<Vec<_>>();
    args.pop(); // Removes args[0]

    while let Some(key) = args.pop() {
        if !key.starts_with("--") {
            return Err(RenderError::Options(format!("Unrecognized key {}", key)));
        }
        match args.last() {
            Some(value) if !value.starts_with("--") => {
                let value = args.pop();
                pairs.insert(key, value);
            }
            _ => {
                pairs.insert(key, None);
            }
        }
    }
    let mut options = CliOptions::default();
    for (k, v) in pairs.into_iter() {
        match k.as_str() {
            "--scene" => options.scene_name = parse_value(&k, v)?,
            "--tracer" => {
                let name: String = parse_value(&k, v)?;
                options.tracer = match name.as_str() {
                    "path" => TracerKind::Path,
                    "direct" => TracerKind::Direct,
                    "ftl" => TracerKind::Ftl,
                    _ => return Err(RenderError::Options(format!("unknown tracer {}", name))),
                }
            }
            "--width" => options.width = parse_value(&k, v)?,
            "--height" => options.height = parse_value(&k, v)?,
            "--spp" => options.spp = parse_value(&k, v)?,
            "--threads" => options.threads = parse_value(&k, v)?,
            "--out" => options.out = parse_value(&k, v)?,
            "--min_depth" => options.min_depth = parse_value(&k, v)?,
            "--termination_prob" => options.termination_prob = parse_value(&k, v)?,
            "--frames" => options.frames = parse_value(&k, v)?,
            "--fps" => options.fps = parse_value(&k, v)?,
            "--region" => {
                let text: String = parse_value(&k, v)?;
                options.region = Some(Region::parse(&text)?);
            }
            "--stratified" => options.stratified = true,
            "--trace_pixel" => options.trace_pixel = Some(parse_pixel(&k, v)?),
            "--save_interval" => options.save_interval = parse_value(&k, v)?,
            "--help" => options.help = true,
            _ => return Err(RenderError::Options(format!("Unrecognized key {}", k))),
        }
    }
    if options.width == 0 || options.height == 0 {
        return Err(RenderError::Options("the image must not be empty".to_string()));
    }
    Ok(options)
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        std::iter::once("lyrender")
            .chain(line.split_whitespace())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let options = parse_args(args(
            "--scene showcase --tracer direct --spp 4 --stratified --trace_pixel 3,4 --out a.exr",
        ))
        .unwrap();
        assert_eq!(options.scene_name, "showcase");
        assert_eq!(options.tracer, TracerKind::Direct);
        assert_eq!(options.spp, 4);
        assert!(options.stratified);
        assert_eq!(options.trace_pixel, Some((3, 4)));
        assert_eq!(options.out, "a.exr");
        assert_eq!(options.width, 512);
    }

    #[test]
    fn test_bad_args() {
        assert!(parse_args(args("--colour red")).is_err());
        assert!(parse_args(args("--spp many")).is_err());
        assert!(parse_args(args("--spp")).is_err());
        assert!(parse_args(args("--tracer bidir")).is_err());
        assert!(parse_args(args("stray")).is_err());
        assert!(parse_args(args("--width 0")).is_err());
    }
}
