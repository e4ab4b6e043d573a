use vergen::EmitBuilder;

fn main() {
    // 生成构建信息，供 --version 显示 git 提交与构建时间
    EmitBuilder::builder()
        .build_timestamp()
        .git_sha(true)
        .emit()
        .expect("Failed to generate build information");
}
