//! # 二维码生成平台 — 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与会话组装。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;

use qr_platform::error::AppError;
use qr_platform::image_handler::{ImageConfig, ImageHandler, ImagePerformanceProfile, ImageSource};
use qr_platform::payload::{EmailForm, PayloadBuilder, PayloadKind, TextForm, UrlForm, VcardForm, WhatsappForm};
use qr_platform::qr::{ExportFormat, FilePreview, HexColor, RasterRenderer, StyleDelta, StyleMode, TerminalPreview};
use qr_platform::session::{GenerationOutcome, PageProfile, PageSession};
use qr_platform::settings::{self, AppSettings};
use qr_platform::share::ClipboardShareSheet;
use qr_platform::storage::SavedFile;

/// 生成带样式、可嵌入 logo 的二维码
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 设置文件路径（默认 ./qr-platform.json）
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// 样式：basic / colored
    #[arg(long, global = true)]
    style: Option<StyleMode>,

    /// 主色（#rrggbb）
    #[arg(long, global = true)]
    primary: Option<HexColor>,

    /// 渐变终点色（#rrggbb），仅 colored 生效
    #[arg(long, global = true)]
    secondary: Option<HexColor>,

    /// logo 图片路径
    #[arg(long, global = true, value_name = "FILE")]
    logo: Option<PathBuf>,

    /// logo 的 Data URL 或纯 Base64 内容，与 --logo 二选一
    #[arg(long, global = true, value_name = "DATA", conflicts_with = "logo")]
    logo_data: Option<String>,

    /// 二维码边长（像素），覆盖页面默认值
    #[arg(long, global = true)]
    size: Option<u32>,

    /// 输出目录
    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<String>,

    /// 导出格式：png / jpeg / svg
    #[arg(long, global = true, default_value = "png")]
    format: ExportFormat,

    /// 文件名（扩展名会被替换）
    #[arg(long, global = true)]
    name: Option<String>,

    /// 生成后分享（写入系统剪贴板）
    #[arg(long, global = true)]
    share: bool,

    /// 在终端中预览
    #[arg(long, global = true)]
    preview: bool,

    /// 额外写出一份 PNG 预览文件
    #[arg(long, global = true, value_name = "FILE")]
    preview_file: Option<PathBuf>,

    /// 覆盖占位延迟（毫秒）
    #[arg(long, global = true, value_name = "MS")]
    delay_ms: Option<u64>,

    /// logo 处理档位：quality / balanced / speed
    #[arg(long, global = true)]
    profile: Option<String>,

    /// 以 JSON 输出结果
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    page: Page,
}

#[derive(Subcommand, Debug)]
enum Page {
    /// 邮件：mailto 链接
    Email {
        #[arg(long)]
        to: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// 纯文本
    Text { text: String },
    /// 网址（需以 http:// 或 https:// 开头）
    Url { url: String },
    /// 首页即时生成网址二维码
    Instant { url: String },
    /// 联系人名片（vCard 3.0）
    Vcard {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "+91")]
        code: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        org: String,
    },
    /// WhatsApp 聊天链接
    Whatsapp {
        #[arg(long, default_value = "+91")]
        code: String,
        #[arg(long)]
        number: String,
        #[arg(long, default_value = "")]
        message: String,
    },
}

impl Page {
    fn into_builder(self) -> Box<dyn PayloadBuilder> {
        match self {
            Page::Email { to, subject, body } => Box::new(EmailForm {
                address: to,
                subject,
                body,
            }),
            Page::Text { text } => Box::new(TextForm { text }),
            Page::Url { url } => Box::new(UrlForm::new(url)),
            Page::Instant { url } => Box::new(UrlForm::instant(url)),
            Page::Vcard {
                name,
                code,
                phone,
                email,
                org,
            } => Box::new(VcardForm {
                name,
                country_code: code,
                phone,
                email,
                organization: org,
            }),
            Page::Whatsapp { code, number, message } => Box::new(WhatsappForm {
                country_code: code,
                number,
                message,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    outcome: GenerationOutcome,
    saved: SavedFile,
    shared: bool,
    notice: Option<String>,
}

fn build_profile(kind: PayloadKind, size: Option<u32>, delay_ms: Option<u64>, settings: &AppSettings) -> PageProfile {
    let mut profile = PageProfile::for_kind(kind, settings);
    if let Some(size) = size {
        profile.size = size;
    }
    if let Some(delay_ms) = delay_ms {
        profile = profile.with_delay(Duration::from_millis(delay_ms));
    }
    profile
}

fn build_image_handler(profile: Option<&str>, settings: &AppSettings) -> Result<ImageHandler, AppError> {
    let handler = ImageHandler::new(ImageConfig::default());
    let profile = match profile {
        Some(raw) => ImagePerformanceProfile::parse(raw)?,
        None => settings.performance_profile(),
    };
    handler.set_performance_profile(profile)?;
    Ok(handler)
}

async fn run(cli: Cli) -> Result<Report, AppError> {
    let settings_path = cli.settings.unwrap_or_else(settings::default_settings_path);
    let app_settings = settings::load_settings_from_path(&settings_path);

    let style = app_settings.style_choice().merge(&StyleDelta {
        mode: cli.style,
        primary: cli.primary,
        secondary: cli.secondary,
    });
    let logo = match (cli.logo, cli.logo_data) {
        (Some(path), _) => Some(ImageSource::FilePath(path.to_string_lossy().to_string())),
        (None, Some(data)) => Some(ImageSource::Base64(data)),
        (None, None) => None,
    };
    let output_dir = cli.output_dir.or_else(|| app_settings.output_dir.clone());

    let images = build_image_handler(cli.profile.as_deref(), &app_settings)?;
    let builder = cli.page.into_builder();
    let profile = build_profile(builder.kind(), cli.size, cli.delay_ms, &app_settings);

    let session = PageSession::new(profile, Arc::new(RasterRenderer::new()), images).with_output_dir(output_dir);
    let outcome = session.generate(builder.as_ref(), style, logo).await?;

    if cli.preview {
        session.preview(&mut TerminalPreview::new(std::io::stdout()))?;
    }
    if let Some(path) = cli.preview_file {
        session.preview(&mut FilePreview::new(path))?;
    }

    let saved = session.download(cli.format, cli.name.as_deref())?;

    let (shared, notice) = if cli.share {
        match session.share(&ClipboardShareSheet::new(app_settings.share_retry)) {
            Ok(()) => (true, None),
            Err(e) if e.is_informational() => {
                log::warn!("ℹ️ {}", e);
                (false, Some(e.to_string()))
            }
            Err(e) => return Err(e),
        }
    } else {
        (false, None)
    };

    Ok(Report {
        outcome,
        saved,
        shared,
        notice,
    })
}

fn print_report(report: &Report, json: bool) -> Result<(), AppError> {
    if json {
        let content = serde_json::to_string_pretty(report)
            .map_err(|e| AppError::Settings(format!("序列化报告失败: {}", e)))?;
        println!("{}", content);
        return Ok(());
    }

    println!("内容: {}", report.outcome.content);
    println!("已保存: {} ({} 字节)", report.saved.path, report.saved.size);
    if let Some(reason) = report.outcome.logo_error.as_ref() {
        println!("logo 未嵌入: {}", reason);
    }
    if report.shared {
        println!("已复制到剪贴板，可直接粘贴分享");
    }
    if let Some(notice) = report.notice.as_ref() {
        println!("{}", notice);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let json = cli.json;

    let result = run(cli).await.and_then(|report| print_report(&report, json));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                let body = serde_json::json!({ "error": &e });
                println!("{}", body);
            } else {
                eprintln!("错误: {}", e);
            }
            match e {
                AppError::Validation(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
