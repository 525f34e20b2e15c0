//! # 二维码生成平台 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  CLI (clap 子命令 = 页面)                 │
//! │                                                          │
//! │  email ── text ── url ── instant ── vcard ── whatsapp    │
//! │       ↓ PayloadBuilder（校验 + 内容字符串）              │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↓ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓            PageSession                           │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                 │
//! │  │                                                       │
//! │  ├─ payload ──── 五类页面的校验与内容构建                │
//! │  │                                                       │
//! │  ├─ image_handler  logo 加载·解码·铺满裁剪·PNG Data URL  │
//! │  │                                                       │
//! │  ├─ qr ───────── 样式推导 + 渲染器能力接口               │
//! │  │   ├─ raster         qrcode + image 位图渲染           │
//! │  │   ├─ svg            SVG 导出                          │
//! │  │   └─ target         文件 / 终端预览                   │
//! │  │                                                       │
//! │  ├─ share        分享能力（剪贴板 + 重试退避）           │
//! │  ├─ storage      输出目录与不覆盖的文件命名              │
//! │  └─ settings     JSON 设置（缺失/损坏回退默认）          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，会话与 CLI 的返回类型 |
//! | [`payload`] | 邮件、文本、URL、名片、WhatsApp 的校验与内容字符串 |
//! | [`image_handler`] | 任意图片 → 居中裁剪的正方形 PNG Data URL |
//! | [`qr`] | `QrStyleConfig` → `QrRenderRequest`，实例创建、实时样式切换、导出 |
//! | [`session`] | 页面会话：生成流程编排、下载、分享、预览 |
//! | [`share`] | 平台分享能力抽象与剪贴板实现 |
//! | [`storage`] | 输出目录获取与自动创建 |
//! | [`settings`] | 应用设置读写 |

pub mod error;
pub mod image_handler;
pub mod payload;
pub mod qr;
pub mod session;
pub mod settings;
pub mod share;
pub mod storage;
