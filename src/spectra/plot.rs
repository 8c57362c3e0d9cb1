//! # 谱图生成
//!
//! 分两步：`prepare_*_figure` 把 TAS/DAS 结果整理成与绘图后端无关的 `Figure`
//! （曲线、坐标范围、标签、带隙标记），`render` 再用 `plotters` 绘制 PNG/SVG。
//!
//! ## 功能
//! - 横轴可选能量 (eV) 或波长 (nm)
//! - 纵轴可选 TAS (ΔT)、DAS (ΔA) 或 JDOS
//! - 自动挑选贡献超过阈值的能带跃迁，或由用户指定
//! - 带隙虚线标记
//!
//! ## 依赖关系
//! - 被 `commands/tas.rs`, `commands/das.rs` 调用
//! - 使用 `spectra/generator.rs` 的 Tas, Das 结构
//! - 使用 `plotters` 渲染图表

use crate::error::{Result, TaspecError};
use crate::spectra::generator::{Das, Tas};
use crate::spectra::jdos::TransitionKey;
use crate::spectra::units::ev_to_nm;

use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// 总谱颜色
const TOTAL_COLOR: (u8, u8, u8) = (0, 0, 0);
/// 第二条 JDOS 总谱颜色
const PARTNER_COLOR: (u8, u8, u8) = (0, 0, 255);
/// 带隙标记颜色
const BANDGAP_COLOR: RGBColor = RGBColor(214, 39, 40);

/// 跃迁曲线调色板
const TRANSITION_PALETTE: [(u8, u8, u8); 9] = [
    (31, 119, 180),
    (255, 127, 14),
    (44, 160, 44),
    (148, 103, 189),
    (140, 86, 75),
    (227, 119, 194),
    (127, 127, 127),
    (188, 189, 34),
    (23, 190, 207),
];

/// 横轴单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum XAxis {
    /// Photon energy (eV)
    Energy,
    /// Wavelength (nm)
    #[default]
    Wavelength,
}

/// 纵轴物理量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum YAxis {
    /// Transient absorption (light - dark)
    #[default]
    Tas,
    /// Differential absorption (new - reference)
    Das,
    /// Joint density of states of both states / systems
    Jdos,
}

impl YAxis {
    fn label(&self) -> &'static str {
        match self {
            YAxis::Tas => "ΔT (a.u.)",
            YAxis::Das => "ΔA (a.u.)",
            YAxis::Jdos => "JDOS (a.u.)",
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            YAxis::Tas => "ΔT",
            YAxis::Das => "ΔA",
            YAxis::Jdos => "JDOS",
        }
    }

    fn symbol_name(&self) -> &'static str {
        match self {
            YAxis::Tas => "TAS",
            YAxis::Das => "DAS",
            YAxis::Jdos => "JDOS",
        }
    }
}

/// 要绘制的能带跃迁
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionSelection {
    /// 最大幅值不低于最强跃迁 `cutoff` 倍的跃迁
    Auto { cutoff: f64 },
    /// 指定跃迁
    Explicit(Vec<TransitionKey>),
}

impl Default for TransitionSelection {
    fn default() -> Self {
        TransitionSelection::Auto { cutoff: 0.03 }
    }
}

/// 绘图选项
#[derive(Debug, Clone, Default)]
pub struct PlotOptions {
    pub x_axis: XAxis,
    pub y_axis: YAxis,
    pub transitions: TransitionSelection,
    /// 横轴范围（与 `x_axis` 同单位）
    pub xmin: Option<f64>,
    pub xmax: Option<f64>,
    pub ymin: Option<f64>,
    pub ymax: Option<f64>,
    /// 覆盖结果中的带隙 (eV)，例如实验值
    pub bandgap: Option<f64>,
    /// 材料名称（用于标题）
    pub material: Option<String>,
    /// 自定义标题
    pub title: Option<String>,
}

/// 一条曲线
#[derive(Debug, Clone)]
pub struct Curve {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub color: (u8, u8, u8),
    pub width: u32,
}

/// 与后端无关的图表描述
#[derive(Debug, Clone)]
pub struct Figure {
    pub curves: Vec<Curve>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub x_label: String,
    pub y_label: String,
    pub title: Option<String>,
    /// 带隙位置（横轴单位）
    pub bandgap: Option<f64>,
}

/// 两个态（光照/暗态或新/参考体系）的谱数据视图
struct SpectrumView<'a> {
    mesh_ev: &'a [f64],
    diff_total: &'a [f64],
    diff_decomp: &'a BTreeMap<TransitionKey, Vec<f64>>,
    diff_axis: YAxis,
    a_total: &'a [f64],
    a_decomp: &'a BTreeMap<TransitionKey, Vec<f64>>,
    a_name: &'static str,
    b_total: &'a [f64],
    b_decomp: &'a BTreeMap<TransitionKey, Vec<f64>>,
    b_name: &'static str,
    bandgap: f64,
    temperature: f64,
    concentration: Option<f64>,
}

/// 选出在 `[lo, hi]` 序号范围内最大幅值不低于 `cutoff × 全局最大值` 的跃迁
///
/// 全部为零的跃迁不会被选中。
pub fn cutoff_transitions(
    decomp: &BTreeMap<TransitionKey, Vec<f64>>,
    cutoff: f64,
    lo: usize,
    hi: usize,
) -> Vec<TransitionKey> {
    let max_abs: Vec<(TransitionKey, f64)> = decomp
        .iter()
        .map(|(key, values)| (*key, window_max_abs(values, lo, hi)))
        .collect();

    let max_val = max_abs.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);

    max_abs
        .into_iter()
        .filter(|(_, v)| *v > 0.0 && *v >= max_val * cutoff)
        .map(|(key, _)| key)
        .collect()
}

fn window_max_abs(values: &[f64], lo: usize, hi: usize) -> f64 {
    if values.is_empty() || lo >= values.len() {
        return 0.0;
    }
    let hi = hi.min(values.len() - 1);
    values[lo..=hi]
        .iter()
        .map(|v| v.abs())
        .fold(0.0_f64, f64::max)
}

/// 准备 TAS 结果的图表
pub fn prepare_tas_figure(tas: &Tas, opts: &PlotOptions) -> Result<Figure> {
    if opts.y_axis == YAxis::Das {
        return Err(TaspecError::InvalidArgument(
            "a TAS result can be plotted as 'tas' or 'jdos', not 'das'".to_string(),
        ));
    }

    let view = SpectrumView {
        mesh_ev: &tas.energy_mesh_ev,
        diff_total: &tas.total_tas,
        diff_decomp: &tas.tas_decomp,
        diff_axis: YAxis::Tas,
        a_total: &tas.jdos_light_total,
        a_decomp: &tas.jdos_light_decomp,
        a_name: "light",
        b_total: &tas.jdos_dark_total,
        b_decomp: &tas.jdos_dark_decomp,
        b_name: "dark",
        bandgap: tas.bandgap,
        temperature: tas.temperature,
        concentration: Some(tas.concentration),
    };
    prepare_figure(&view, opts)
}

/// 准备 DAS 结果的图表
pub fn prepare_das_figure(das: &Das, opts: &PlotOptions) -> Result<Figure> {
    if opts.y_axis == YAxis::Tas {
        return Err(TaspecError::InvalidArgument(
            "a DAS result can be plotted as 'das' or 'jdos', not 'tas'".to_string(),
        ));
    }

    let view = SpectrumView {
        mesh_ev: &das.energy_mesh_ev,
        diff_total: &das.das_total,
        diff_decomp: &das.das_decomp,
        diff_axis: YAxis::Das,
        a_total: &das.jdos_new_total,
        a_decomp: &das.jdos_new_decomp,
        a_name: "new",
        b_total: &das.jdos_ref_total,
        b_decomp: &das.jdos_ref_decomp,
        b_name: "ref",
        bandgap: das.bandgap_new,
        temperature: das.temperature,
        concentration: None,
    };
    prepare_figure(&view, opts)
}

fn prepare_figure(view: &SpectrumView<'_>, opts: &PlotOptions) -> Result<Figure> {
    let (xs, x_label) = match opts.x_axis {
        XAxis::Energy => (view.mesh_ev.to_vec(), "Energy (eV)"),
        XAxis::Wavelength => (
            view.mesh_ev.iter().map(|&e| ev_to_nm(e)).collect::<Vec<_>>(),
            "Wavelength (nm)",
        ),
    };

    let (lo, hi) = select_index_range(&xs, opts)?;

    let points = |values: &[f64]| -> Vec<(f64, f64)> {
        (lo..=hi)
            .filter(|&i| xs[i].is_finite() && values[i].is_finite())
            .map(|i| (xs[i], values[i]))
            .collect()
    };

    let mut curves = Vec::new();
    let mut palette = TRANSITION_PALETTE.iter().cycle();

    match opts.y_axis {
        YAxis::Tas | YAxis::Das => {
            curves.push(Curve {
                label: format!("total {}", view.diff_axis.symbol_name()),
                points: points(view.diff_total),
                color: TOTAL_COLOR,
                width: 3,
            });

            for key in selected_transitions(view.diff_decomp, &opts.transitions, lo, hi)? {
                curves.push(Curve {
                    label: key.to_string(),
                    points: points(&view.diff_decomp[&key]),
                    color: *palette.next().unwrap_or(&TOTAL_COLOR),
                    width: 2,
                });
            }
        }
        YAxis::Jdos => {
            curves.push(Curve {
                label: format!("JDOS ({})", view.a_name),
                points: points(view.a_total),
                color: TOTAL_COLOR,
                width: 2,
            });
            curves.push(Curve {
                label: format!("JDOS ({})", view.b_name),
                points: points(view.b_total),
                color: PARTNER_COLOR,
                width: 2,
            });

            let explicit = matches!(opts.transitions, TransitionSelection::Explicit(_));
            for key in selected_transitions(view.a_decomp, &opts.transitions, lo, hi)? {
                let color = *palette.next().unwrap_or(&TOTAL_COLOR);
                curves.push(Curve {
                    label: format!("{} ({})", key, view.a_name),
                    points: points(&view.a_decomp[&key]),
                    color,
                    width: 1,
                });

                if let Some(partner) = view.b_decomp.get(&key) {
                    // 自动模式下只画非零的暗态/参考曲线
                    if explicit || window_max_abs(partner, lo, hi) > 0.0 {
                        curves.push(Curve {
                            label: format!("{} ({})", key, view.b_name),
                            points: points(partner),
                            color: lighten(color),
                            width: 1,
                        });
                    }
                }
            }
        }
    }

    let x_range = x_plot_range(&curves, opts)?;
    let y_range = y_plot_range(&curves, opts)?;

    let bandgap_ev = opts.bandgap.unwrap_or(view.bandgap);
    let bandgap = match opts.x_axis {
        XAxis::Energy => Some(bandgap_ev),
        XAxis::Wavelength => Some(ev_to_nm(bandgap_ev)),
    }
    .filter(|x| x.is_finite());

    let title = opts.title.clone().or_else(|| {
        let material = opts.material.as_ref()?;
        let symbol = opts.y_axis.symbol();
        match view.concentration {
            Some(n) => Some(format!(
                "{} spectrum of {} at T = {} K, n = {:e} cm⁻³",
                symbol, material, view.temperature, n
            )),
            None => Some(format!(
                "{} spectrum of {} at T = {} K",
                symbol, material, view.temperature
            )),
        }
    });

    Ok(Figure {
        curves,
        x_range,
        y_range,
        x_label: x_label.to_string(),
        y_label: opts.y_axis.label().to_string(),
        title,
        bandgap,
    })
}

/// 校验横轴范围并换算为网格序号区间（闭区间）
///
/// 波长随序号递减，因此 `xmin` 对应区间上端。
fn select_index_range(xs: &[f64], opts: &PlotOptions) -> Result<(usize, usize)> {
    let finite: Vec<f64> = xs.iter().copied().filter(|x| x.is_finite()).collect();
    if finite.is_empty() {
        return Err(TaspecError::PlotRange(
            "is empty: the energy mesh has no finite points".to_string(),
        ));
    }
    let mesh_min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mesh_max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    for (name, value) in [("xmin", opts.xmin), ("xmax", opts.xmax)] {
        if let Some(v) = value {
            if v < mesh_min {
                return Err(TaspecError::PlotRange(format!(
                    "{} value is smaller than energy mesh minimum. Please specify in same units as xaxis",
                    name
                )));
            }
            if v > mesh_max {
                return Err(TaspecError::PlotRange(format!(
                    "{} value is larger than energy mesh maximum. Please specify in same units as xaxis",
                    name
                )));
            }
        }
    }
    if let (Some(a), Some(b)) = (opts.xmin, opts.xmax) {
        if a >= b {
            return Err(TaspecError::PlotRange(format!(
                "xmin ({}) must be smaller than xmax ({})",
                a, b
            )));
        }
    }

    let last = xs.len() - 1;
    let (lo, hi) = match opts.x_axis {
        XAxis::Energy => (
            opts.xmin.map(|v| nearest_index(xs, v)).unwrap_or(0),
            opts.xmax.map(|v| nearest_index(xs, v)).unwrap_or(last),
        ),
        XAxis::Wavelength => (
            opts.xmax.map(|v| nearest_index(xs, v)).unwrap_or(0),
            opts.xmin.map(|v| nearest_index(xs, v)).unwrap_or(last),
        ),
    };

    Ok((lo.min(hi), hi.max(lo)))
}

/// 距离 `value` 最近的有限网格点序号
fn nearest_index(xs: &[f64], value: f64) -> usize {
    xs.iter()
        .enumerate()
        .filter(|(_, x)| x.is_finite())
        .fold((0, f64::INFINITY), |best, (i, x)| {
            let d = (x - value).abs();
            if d < best.1 {
                (i, d)
            } else {
                best
            }
        })
        .0
}

fn selected_transitions(
    decomp: &BTreeMap<TransitionKey, Vec<f64>>,
    selection: &TransitionSelection,
    lo: usize,
    hi: usize,
) -> Result<Vec<TransitionKey>> {
    match selection {
        TransitionSelection::Auto { cutoff } => Ok(cutoff_transitions(decomp, *cutoff, lo, hi)),
        TransitionSelection::Explicit(keys) => {
            if let Some(missing) = keys.iter().find(|k| !decomp.contains_key(k)) {
                return Err(TaspecError::UnknownTransition(missing.to_string()));
            }
            Ok(keys.clone())
        }
    }
}

fn x_plot_range(curves: &[Curve], opts: &PlotOptions) -> Result<(f64, f64)> {
    let (data_min, data_max) = extent(curves.iter().flat_map(|c| c.points.iter().map(|p| p.0)));
    let lo = opts.xmin.unwrap_or(data_min);
    let hi = opts.xmax.unwrap_or(data_max);
    if !(lo.is_finite() && hi.is_finite()) {
        return Err(TaspecError::PlotRange("contains no plottable points".to_string()));
    }
    if hi > lo {
        Ok((lo, hi))
    } else {
        Ok((lo - 0.5, hi + 0.5))
    }
}

fn y_plot_range(curves: &[Curve], opts: &PlotOptions) -> Result<(f64, f64)> {
    let (data_min, data_max) = extent(curves.iter().flat_map(|c| c.points.iter().map(|p| p.1)));
    let (data_min, data_max) = if data_min.is_finite() {
        (data_min, data_max)
    } else {
        (0.0, 0.0)
    };

    let span = if data_max > data_min {
        data_max - data_min
    } else {
        1.0
    };
    let lo = opts.ymin.unwrap_or(data_min - 0.15 * span);
    let hi = opts.ymax.unwrap_or(data_max + 0.15 * span);

    if lo >= hi {
        return Err(TaspecError::PlotRange(format!(
            "ymin ({}) must be smaller than ymax ({})",
            lo, hi
        )));
    }
    Ok((lo, hi))
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn lighten(color: (u8, u8, u8)) -> (u8, u8, u8) {
    let mix = |c: u8| c + (255 - c) / 2;
    (mix(color.0), mix(color.1), mix(color.2))
}

fn plot_err<E: std::fmt::Debug>(e: E) -> TaspecError {
    TaspecError::PlotError(format!("{:?}", e))
}

/// 渲染图表（PNG 或 SVG）
pub fn render(figure: &Figure, output_path: &Path, width: u32, height: u32, use_svg: bool) -> Result<()> {
    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_figure(&root, figure)?;
        root.present().map_err(plot_err)?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_figure(&root, figure)?;
        root.present().map_err(plot_err)?;
    }
    Ok(())
}

/// 绘制图表的核心逻辑
fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    figure: &Figure,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let (x0, x1) = figure.x_range;
    let (y0, y1) = figure.y_range;

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(80);
    if let Some(title) = &figure.title {
        builder.caption(title, ("sans-serif", 26).into_font());
    }
    let mut chart = builder
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 20))
        .draw()
        .map_err(plot_err)?;

    for curve in &figure.curves {
        let color = RGBColor(curve.color.0, curve.color.1, curve.color.2);
        let width = curve.width;
        chart
            .draw_series(LineSeries::new(
                curve.points.iter().copied(),
                color.stroke_width(width),
            ))
            .map_err(plot_err)?
            .label(curve.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width)));
    }

    // 带隙虚线
    if let Some(bg) = figure.bandgap {
        if bg > x0.min(x1) && bg < x0.max(x1) {
            let segments = 40;
            let dy = (y1 - y0) / segments as f64;
            let dashes = (0..segments).step_by(2).map(move |i| {
                PathElement::new(
                    vec![(bg, y0 + i as f64 * dy), (bg, y0 + (i + 1) as f64 * dy)],
                    BANDGAP_COLOR.stroke_width(2),
                )
            });
            chart
                .draw_series(dashes)
                .map_err(plot_err)?
                .label("Bandgap")
                .legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 8, y)], BANDGAP_COLOR.stroke_width(2))
                });
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .label_font(("sans-serif", 14))
        .draw()
        .map_err(plot_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: i64, f: i64) -> TransitionKey {
        TransitionKey::new(i, f, None)
    }

    /// 0–4.99 eV 网格上的人工 TAS：(0,1) 强，(-1,1) 弱，(-2,1) 为零
    fn synthetic_tas() -> Tas {
        let mesh: Vec<f64> = (0..500).map(|i| i as f64 * 0.01).collect();
        let peak = |c: f64, h: f64| -> Vec<f64> {
            mesh.iter()
                .map(|&e| h * (-(e - c).powi(2) / 0.02).exp())
                .collect()
        };

        let strong = peak(2.0, -1.0);
        let weak = peak(3.0, 0.01);
        let zero = vec![0.0; mesh.len()];
        let total: Vec<f64> = strong.iter().zip(&weak).map(|(a, b)| a + b).collect();

        let mut decomp = BTreeMap::new();
        decomp.insert(key(0, 1), strong.clone());
        decomp.insert(key(-1, 1), weak.clone());
        decomp.insert(key(-2, 1), zero.clone());

        let mut light = BTreeMap::new();
        light.insert(key(0, 1), peak(2.0, 1.0));
        light.insert(key(-1, 1), peak(3.0, 1.0));
        light.insert(key(-2, 1), zero.clone());

        let mut dark = BTreeMap::new();
        dark.insert(key(0, 1), peak(2.0, 2.0));
        dark.insert(key(-1, 1), zero.clone());
        dark.insert(key(-2, 1), zero);

        Tas {
            total_tas: total,
            tas_decomp: decomp,
            jdos_light_total: peak(2.0, 1.0),
            jdos_light_decomp: light,
            jdos_dark_total: peak(2.0, 2.0),
            jdos_dark_decomp: dark,
            energy_mesh_ev: mesh,
            bandgap: 1.5,
            temperature: 300.0,
            concentration: 1e21,
        }
    }

    fn energy_opts() -> PlotOptions {
        PlotOptions {
            x_axis: XAxis::Energy,
            ..PlotOptions::default()
        }
    }

    fn labels(figure: &Figure) -> Vec<&str> {
        figure.curves.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn test_plot_cutoff_transitions() {
        let tas = synthetic_tas();
        let all = cutoff_transitions(&tas.tas_decomp, 0.001, 0, 499);
        assert_eq!(all, vec![key(-1, 1), key(0, 1)]);

        let strong_only = cutoff_transitions(&tas.tas_decomp, 0.03, 0, 499);
        assert_eq!(strong_only, vec![key(0, 1)]);

        // 只看 2.5–4.99 eV 时弱跃迁成为最强
        let window = cutoff_transitions(&tas.tas_decomp, 0.03, 250, 499);
        assert!(window.contains(&key(-1, 1)));
    }

    #[test]
    fn test_plot_tas_energy_axis() {
        let tas = synthetic_tas();
        let figure = prepare_tas_figure(&tas, &energy_opts()).unwrap();

        assert_eq!(labels(&figure), vec!["total TAS", "(0, 1)"]);
        assert_eq!(figure.x_label, "Energy (eV)");
        assert_eq!(figure.y_label, "ΔT (a.u.)");
        assert_eq!(figure.bandgap, Some(1.5));
        assert_eq!(figure.curves[0].points.len(), 500);
        assert_eq!(figure.title, None);

        // 默认纵轴范围包含数据并留出余量
        let (y0, y1) = figure.y_range;
        assert!(y0 < -1.0 && y1 > 0.0);
    }

    #[test]
    fn test_plot_wavelength_axis_drops_zero_energy() {
        let tas = synthetic_tas();
        let figure = prepare_tas_figure(&tas, &PlotOptions::default()).unwrap();

        assert_eq!(figure.x_label, "Wavelength (nm)");
        // 0 eV 对应无穷波长，被丢弃
        assert_eq!(figure.curves[0].points.len(), 499);
        let bg = figure.bandgap.unwrap();
        assert!((bg - ev_to_nm(1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_plot_wavelength_limits_map_to_reversed_indices() {
        let tas = synthetic_tas();
        let opts = PlotOptions {
            xmin: Some(400.0),
            xmax: Some(800.0),
            ..PlotOptions::default()
        };
        let figure = prepare_tas_figure(&tas, &opts).unwrap();

        let xs: Vec<f64> = figure.curves[0].points.iter().map(|p| p.0).collect();
        let min = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!((min - 400.0).abs() < 2.0, "min = {}", min);
        assert!((max - 800.0).abs() < 3.0, "max = {}", max);
        assert_eq!(figure.x_range, (400.0, 800.0));
    }

    #[test]
    fn test_plot_range_validation_messages() {
        let tas = synthetic_tas();

        let opts = PlotOptions {
            xmin: Some(-1.0),
            ..energy_opts()
        };
        let err = prepare_tas_figure(&tas, &opts).unwrap_err().to_string();
        assert!(err.contains("xmin value is smaller than energy mesh minimum"));

        let opts = PlotOptions {
            xmax: Some(10.0),
            ..energy_opts()
        };
        let err = prepare_tas_figure(&tas, &opts).unwrap_err().to_string();
        assert!(err.contains("xmax value is larger than energy mesh maximum"));

        let opts = PlotOptions {
            xmin: Some(3.0),
            xmax: Some(2.0),
            ..energy_opts()
        };
        assert!(prepare_tas_figure(&tas, &opts).is_err());
    }

    #[test]
    fn test_plot_jdos_mode_skips_zero_dark_partner() {
        let tas = synthetic_tas();
        let opts = PlotOptions {
            y_axis: YAxis::Jdos,
            transitions: TransitionSelection::Auto { cutoff: 0.03 },
            ..energy_opts()
        };
        let figure = prepare_tas_figure(&tas, &opts).unwrap();

        assert_eq!(
            labels(&figure),
            vec![
                "JDOS (light)",
                "JDOS (dark)",
                "(-1, 1) (light)",
                "(0, 1) (light)",
                "(0, 1) (dark)",
            ]
        );
        assert_eq!(figure.y_label, "JDOS (a.u.)");
    }

    #[test]
    fn test_plot_explicit_transitions() {
        let tas = synthetic_tas();
        let opts = PlotOptions {
            transitions: TransitionSelection::Explicit(vec![key(-2, 1)]),
            ..energy_opts()
        };
        let figure = prepare_tas_figure(&tas, &opts).unwrap();
        assert_eq!(labels(&figure), vec!["total TAS", "(-2, 1)"]);

        let opts = PlotOptions {
            transitions: TransitionSelection::Explicit(vec![key(5, 9)]),
            ..energy_opts()
        };
        assert!(matches!(
            prepare_tas_figure(&tas, &opts),
            Err(TaspecError::UnknownTransition(_))
        ));
    }

    #[test]
    fn test_plot_title_and_bandgap_override() {
        let tas = synthetic_tas();
        let opts = PlotOptions {
            material: Some("CdTe".to_string()),
            bandgap: Some(1.44),
            ..energy_opts()
        };
        let figure = prepare_tas_figure(&tas, &opts).unwrap();
        assert_eq!(
            figure.title.as_deref(),
            Some("ΔT spectrum of CdTe at T = 300 K, n = 1e21 cm⁻³")
        );
        assert_eq!(figure.bandgap, Some(1.44));
    }

    #[test]
    fn test_plot_axis_mismatch() {
        let tas = synthetic_tas();
        let opts = PlotOptions {
            y_axis: YAxis::Das,
            ..energy_opts()
        };
        assert!(prepare_tas_figure(&tas, &opts).is_err());
    }

    #[test]
    fn test_plot_das_figure() {
        let tas = synthetic_tas();
        let das = Das {
            das_total: tas.total_tas.clone(),
            das_decomp: tas.tas_decomp.clone(),
            jdos_new_total: tas.jdos_light_total.clone(),
            jdos_new_decomp: tas.jdos_light_decomp.clone(),
            jdos_ref_total: tas.jdos_dark_total.clone(),
            jdos_ref_decomp: tas.jdos_dark_decomp.clone(),
            energy_mesh_ev: tas.energy_mesh_ev.clone(),
            bandgap_new: 1.2,
            bandgap_ref: 1.5,
            temperature: 300.0,
        };
        let opts = PlotOptions {
            y_axis: YAxis::Das,
            material: Some("MAPI".to_string()),
            ..energy_opts()
        };
        let figure = prepare_das_figure(&das, &opts).unwrap();
        assert_eq!(figure.curves[0].label, "total DAS");
        assert_eq!(figure.y_label, "ΔA (a.u.)");
        assert_eq!(figure.bandgap, Some(1.2));
        assert_eq!(
            figure.title.as_deref(),
            Some("ΔA spectrum of MAPI at T = 300 K")
        );
    }
}
