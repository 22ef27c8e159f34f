use dockflow_core::WorkflowVariant;

use crate::workflow::{Job, Step, Workflow};

const BRANCH: &str = "main";
const RUNNER: &str = "ubuntu-latest";
const TOKEN: &str = "${{ secrets.GITHUB_TOKEN }}";

struct Flavor {
    title: &'static str,
    image: &'static str,
    dockerfile: &'static [&'static str],
}

fn flavor(variant: WorkflowVariant) -> Flavor {
    match variant {
        WorkflowVariant::Generic => Flavor {
            title: "Build & Release Docker Image",
            image: "app",
            dockerfile: &["FROM alpine", r#"CMD ["echo","Hello from Docker"]"#],
        },
        WorkflowVariant::StaticSite => Flavor {
            title: "Build & Release Static Site Image",
            image: "site",
            dockerfile: &[
                "FROM nginx:alpine",
                "COPY . /usr/share/nginx/html",
                "EXPOSE 80",
            ],
        },
    }
}

/// Builds the workflow a variant writes. Only the Dockerfile generation step
/// and image naming differ between variants.
pub(crate) fn workflow_for(variant: WorkflowVariant) -> Workflow {
    let flavor = flavor(variant);
    let image = flavor.image;

    let job = Job::new("build-and-release", RUNNER)
        .step(Step::action("Check out code", "actions/checkout@v3"))
        .step(Step::script(
            "Generate Dockerfile",
            dockerfile_script(flavor.dockerfile),
        ))
        .step(Step::script(
            "Build Docker image",
            [format!("docker build -t {image}:${{{{ github.sha }}}} .")],
        ))
        .step(Step::script(
            "Save image to tarball",
            [
                format!("IMAGE_TAG=\"{image}-${{{{ github.sha }}}}\""),
                format!("docker tag {image}:${{{{ github.sha }}}} $IMAGE_TAG"),
                "docker save $IMAGE_TAG -o image.tar".to_string(),
            ],
        ))
        .step(
            Step::script(
                "Create Git tag",
                [
                    r#"TAG="v$(date +'%Y%m%d%H%M%S')""#,
                    r#"echo "tag=$TAG" >> $GITHUB_OUTPUT"#,
                    "",
                    r#"git config user.name "github-actions[bot]""#,
                    r#"git config user.email "github-actions[bot]@users.noreply.github.com""#,
                    "",
                    "git tag $TAG",
                    "git push origin $TAG",
                ],
            )
            .id("tag")
            .env("GITHUB_TOKEN", TOKEN),
        )
        .step(
            Step::action("Create Release & Upload Image", "softprops/action-gh-release@v1")
                .with("tag_name", "${{ steps.tag.outputs.tag }}")
                .with("release_name", "Release ${{ steps.tag.outputs.tag }}")
                .with("files", "image.tar")
                .env("GITHUB_TOKEN", TOKEN),
        );

    Workflow::new(flavor.title)
        .on_push(BRANCH)
        .permission("contents", "write")
        .job(job)
}

/// Emits `echo` lines that write the Dockerfile, quoting each line with
/// whichever quote it does not contain.
fn dockerfile_script(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let redirect = if index == 0 { ">" } else { ">>" };
            if line.contains('"') {
                format!("echo '{line}' {redirect} Dockerfile")
            } else {
                format!("echo \"{line}\" {redirect} Dockerfile")
            }
        })
        .collect()
}
