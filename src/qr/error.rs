/// 二维码渲染错误。
///
/// 对已有实例的更新失败（`Rejected` / `InvalidImage`）统一视为“更新被拒绝”，
/// 调用方记录日志后保留实例的上一个有效状态。
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("二维码编码失败：{0}")]
    Encode(String),

    #[error("二维码尺寸 {size}px 超出上限 {max}px")]
    SizeOutOfRange { size: u32, max: u32 },

    #[error("颜色格式错误：{0}")]
    InvalidColor(String),

    #[error("未知样式：{0}（可选：basic / colored）")]
    InvalidStyle(String),

    #[error("logo 图片无效：{0}")]
    InvalidImage(String),

    #[error("渲染器拒绝更新：{0}")]
    Rejected(String),

    #[error("导出失败：{0}")]
    Export(String),

    #[error("挂载预览失败：{0}")]
    Target(String),
}
