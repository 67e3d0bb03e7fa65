mod ffprobe_info;
mod output_layout;
mod path_validator;
mod video_scanner;

pub use ffprobe_info::{VideoInfo, get_video_info};
pub use output_layout::{
    CLIP_EXTENSION, KEYFRAME_EXTENSION, KEYFRAMES_DIR_NAME, KeyframeEntry, MERGED_DIR_NAME,
    OUTPUT_DIR_NAME, OutputLayout, PARTIAL_SUFFIX, THUMBNAILS_DIR_NAME, is_scene_clip_file,
    list_scene_clips, parse_scene_index, partial_path,
};
pub(crate) use output_layout::list_files_with_extension;
pub use path_validator::{ensure_directory_exists, validate_directory_exists};
pub use video_scanner::{VideoTask, scan_video_files};
